use ferrum_reduce::api::reduce::SumReducer;
use ferrum_reduce::core::codec::RecordEncoder;
use ferrum_reduce::core::naming::{IntermediateNaming, MrTmpNaming};
use ferrum_reduce::core::task::{ReduceTask, Task};
use ferrum_reduce::KeyValue;
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const NUM_REDUCERS: usize = 2;

const DOCUMENTS: [&str; 3] = [
    "the quick brown fox jumps over the lazy dog",
    "the dog barks and the fox runs",
    "a quick brown dog",
];

fn partition_for(word: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    word.hash(&mut hasher);
    (hasher.finish() as usize) % NUM_REDUCERS
}

// stands in for the map phase: one intermediate file per (document, partition)
fn write_map_outputs(naming: &MrTmpNaming, job: &str) -> std::io::Result<()> {
    for (map_index, document) in DOCUMENTS.iter().enumerate() {
        let mut encoders = Vec::with_capacity(NUM_REDUCERS);
        for partition in 0..NUM_REDUCERS {
            let file = File::create(naming.intermediate_path(job, map_index, partition))?;
            encoders.push(RecordEncoder::new(file));
        }
        for word in document.split_whitespace() {
            let encoder = &mut encoders[partition_for(word)];
            if let Err(err) = encoder.encode(&KeyValue::new(word, "1")) {
                eprintln!("map {}: {}", map_index, err);
            }
        }
        for encoder in &mut encoders {
            if let Err(err) = encoder.flush() {
                eprintln!("map {}: {}", map_index, err);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let dir = std::env::temp_dir().join(format!("word_count_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    let naming = MrTmpNaming::new(&dir);

    write_map_outputs(&naming, "wc")?;

    // one reduce task per partition
    for partition in 0..NUM_REDUCERS {
        let task = ReduceTask::new(
            "wc",
            partition,
            naming.merge_path("wc", partition),
            DOCUMENTS.len(),
            Arc::new(SumReducer),
        )
        .with_naming(Arc::new(naming.clone()));

        let report = task.execute().await?;
        println!("{}", serde_json::to_string(&report)?);
        println!("{}", std::fs::read_to_string(&report.output_path)?);
    }

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
