use serde::Serialize;

use breathpacer_core::technique::DURATION_PRESETS;
use breathpacer_core::{Config, Technique};

#[derive(Serialize)]
struct TechniqueSummary<'a> {
    id: &'a str,
    name: &'a str,
    tagline: &'a str,
    cycle_secs: f64,
    phases: usize,
}

impl<'a> From<&'a Technique> for TechniqueSummary<'a> {
    fn from(t: &'a Technique) -> Self {
        Self {
            id: &t.id,
            name: &t.name,
            tagline: &t.tagline,
            cycle_secs: t.cycle_ms() as f64 / 1000.0,
            phases: t.phases.len(),
        }
    }
}

/// `list`: one line per technique, built-in first.
pub fn list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Config::load()?.catalog()?;
    if json {
        let list: Vec<TechniqueSummary> = catalog.iter().map(TechniqueSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    for t in catalog.iter() {
        println!("{:<16} {:<24} {}", t.id, t.name, t.tagline);
    }
    Ok(())
}

/// `show`: instructions and evidence for one technique.
pub fn show(id: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let t = Config::load()?.technique(Some(id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&t)?);
    } else {
        print_details(&t);
    }
    Ok(())
}

fn print_details(t: &Technique) {
    println!("{} ({})", t.name, t.id);
    if !t.tagline.is_empty() {
        println!("{}", t.tagline);
    }
    if !t.best_for.is_empty() {
        println!("\nBest for: {}", t.best_for.join(", "));
    }

    println!("\nPhases ({}s cycle):", t.cycle_ms() as f64 / 1000.0);
    for phase in &t.phases {
        println!("  {:<13} {:>4}s  {}", phase.name.label(), phase.duration_secs, phase.instruction);
    }

    if !t.instructions.is_empty() {
        println!("\nHow to:");
        for (i, step) in t.instructions.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }
    if !t.why_it_works.is_empty() {
        println!("\nWhy it works:\n  {}", t.why_it_works);
    }
    if !t.evidence.is_empty() {
        println!("\nKey evidence:");
        for c in &t.evidence {
            println!("  {} ({})  {}", c.label, c.reference(), c.url());
        }
    }

    let presets: Vec<&str> = DURATION_PRESETS.iter().map(|p| p.label).collect();
    println!("\nSession lengths: {}", presets.join(" / "));
}
