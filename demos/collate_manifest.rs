//! Example: Index a manifest, sort it by length and collate every batch
//!
//! Usage:
//!   cargo run --release --example collate_manifest -- \
//!       --sample-rate 16000 [--batch-size N] [--no-sort] <manifest.tsv> <clips_dir>
//!
//! Prints one line per batch with its tensor shape and padding share.

use std::env;
use std::time::Instant;

use vae_audio_data::{AudioIndex, Collator, FeatureConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut sample_rate: Option<u32> = None;
    let mut batch_size = 16usize;
    let mut sort = true;
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--sample-rate" => {
                let v = args
                    .first()
                    .ok_or("--sample-rate requires a value")?
                    .parse::<u32>()?;
                args.remove(0);
                sample_rate = Some(v);
            }
            "--batch-size" => {
                let v = args
                    .first()
                    .ok_or("--batch-size requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                batch_size = std::cmp::max(1, v);
            }
            "--no-sort" => sort = false,
            "--help" | "-h" => {
                eprintln!(
                    "Usage: collate_manifest --sample-rate HZ [--batch-size N] [--no-sort] <manifest.tsv> <clips_dir>\n\
                     \n\
                     --sample-rate HZ  Sample rate of every clip (required)\n\
                     --batch-size N    Paths per batch (default: 16)\n\
                     --no-sort         Keep manifest order instead of sorting by length\n"
                );
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    let (manifest, clips) = match positional.as_slice() {
        [manifest, clips] => (manifest.clone(), clips.clone()),
        _ => {
            eprintln!("ERROR: Provide a manifest and a clips directory. Use --help for usage.");
            std::process::exit(2);
        }
    };
    let sample_rate = sample_rate.ok_or("--sample-rate is required")?;

    let mut index = AudioIndex::from_manifest(&manifest, &clips)?;
    eprintln!("Index: {} clips from {}", index.len(), manifest);

    if sort {
        let t0 = Instant::now();
        index.sort_by_length()?;
        eprintln!("Sorted by length in {:.2} s", t0.elapsed().as_secs_f32());
    }

    let collator = Collator::new(FeatureConfig::new(sample_rate))?;
    let t0 = Instant::now();
    for (i, paths) in index.batches(batch_size)?.enumerate() {
        let batch = collator.collate(&paths)?;
        println!(
            "batch {:>4}: shape {:?}, padding {:.1}%",
            i,
            batch.features.shape(),
            batch.padding_ratio() * 100.0
        );
    }
    eprintln!("Collated all batches in {:.2} s", t0.elapsed().as_secs_f32());

    Ok(())
}
