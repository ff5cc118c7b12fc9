use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-species feature distribution: (mean, std) for each of the four
/// measurement columns.
struct Species {
    name: &'static str,
    features: [(f64, f64); 4],
}

const FEATURE_NAMES: [&str; 4] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

const SPECIES: [Species; 3] = [
    Species {
        name: "setosa",
        features: [(5.0, 0.35), (3.4, 0.38), (1.5, 0.17), (0.25, 0.11)],
    },
    Species {
        name: "versicolor",
        features: [(5.9, 0.52), (2.8, 0.31), (4.3, 0.47), (1.3, 0.20)],
    },
    Species {
        name: "virginica",
        features: [(6.6, 0.64), (3.0, 0.32), (5.5, 0.55), (2.0, 0.27)],
    },
];

const ROWS_PER_SPECIES: usize = 50;

/// Box-Muller transform for normally distributed samples.
fn gauss(rng: &mut ChaCha8Rng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(1e-15..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn main() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let output_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header: Vec<&str> = FEATURE_NAMES.to_vec();
    header.push("species");
    writer.write_record(&header).context("writing header")?;

    let mut rows = 0usize;
    for species in &SPECIES {
        for _ in 0..ROWS_PER_SPECIES {
            let mut record: Vec<String> = species
                .features
                .iter()
                .map(|&(mean, std)| format!("{:.2}", gauss(&mut rng, mean, std).max(0.1)))
                .collect();
            record.push(species.name.to_string());
            writer.write_record(&record).context("writing row")?;
            rows += 1;
        }
    }

    writer.flush().context("flushing CSV")?;
    println!(
        "Wrote {rows} rows ({} species) to {output_path}",
        SPECIES.len()
    );
    Ok(())
}
