//! Sample Transaction Generator
//!
//! Writes a labeled CSV batch (`time,amount,v1..v28,class`) for exercising
//! the scoring pipeline.
//!
//! Usage: sample_generator [output.csv] [count] [fraud_rate] [seed]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

const FEATURE_COUNT: usize = 28;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Random transaction generator
struct TransactionGenerator {
    rng: StdRng,
    clock: f64,
}

impl TransactionGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, clock: 0.0 }
    }

    /// Advance the clock and return the elapsed seconds
    fn tick(&mut self) -> f64 {
        self.clock += self.rng.gen_range(1.0..120.0);
        self.clock
    }

    /// Daytime, modest amount, features near zero
    fn generate_legitimate(&mut self) -> Vec<String> {
        let mut time = self.tick();
        if time % SECONDS_PER_DAY < 6.0 * 3600.0 {
            time += 6.0 * 3600.0;
        }
        let amount = self.rng.gen_range(1.0..500.0);
        self.row(time, amount, 1.0, false)
    }

    /// Night-time, high amount, features far from zero
    fn generate_suspicious(&mut self) -> Vec<String> {
        let day = (self.tick() / SECONDS_PER_DAY).floor();
        let time = day * SECONDS_PER_DAY + self.rng.gen_range(0.0..6.0 * 3600.0);
        let amount = self.rng.gen_range(1000.0..10000.0);
        self.row(time, amount, 4.0, true)
    }

    fn row(&mut self, time: f64, amount: f64, spread: f64, fraud: bool) -> Vec<String> {
        let mut row = Vec::with_capacity(FEATURE_COUNT + 3);
        row.push(format!("{:.0}", time));
        row.push(format!("{:.2}", amount));
        for _ in 0..FEATURE_COUNT {
            row.push(format!("{:.6}", self.rng.gen_range(-spread..spread)));
        }
        row.push(if fraud { "1" } else { "0" }.to_string());
        row
    }
}

fn header() -> Vec<String> {
    let mut header = vec!["time".to_string(), "amount".to_string()];
    header.extend((1..=FEATURE_COUNT).map(|i| format!("v{}", i)));
    header.push("class".to_string());
    header
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_generator=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("transactions.csv");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1000);
    let fraud_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.02_f64)
        .clamp(0.0, 1.0);
    let seed: Option<u64> = args.get(4).and_then(|s| s.parse().ok());

    info!(
        output = %output,
        count = count,
        fraud_rate = fraud_rate,
        seed = ?seed,
        "Configuration loaded"
    );

    let mut generator = TransactionGenerator::new(seed);
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(output)?));
    writer.write_record(header())?;

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let row = if generator.rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };
        writer.write_record(&row)?;

        if (i + 1) % 1000 == 0 {
            info!("Generated {}/{} transactions", i + 1, count);
        }
    }

    writer.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} legitimate, {} suspicious) to {}",
        count, legitimate_count, suspicious_count, output
    );

    Ok(())
}
