use callscore_record::AnalysisRecord;

use crate::{CallPipeline, PipelineError};

/// Result of one call within a batch. Failures are reported, never
/// propagated: one bad call must not stop the rest of the batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub audio_ref: String,
    pub result: Result<AnalysisRecord, PipelineError>,
}

/// Fans a batch of calls out over `jobs` worker threads.
///
/// Each worker pulls references off a shared channel and runs the full
/// pipeline for one call at a time; workers share nothing but the
/// read-only pipeline. Outcomes come back in input order regardless of
/// which worker finished first.
pub fn process_batch(
    pipeline: &CallPipeline,
    audio_refs: &[String],
    jobs: usize,
) -> Vec<BatchOutcome> {
    if audio_refs.is_empty() {
        return Vec::new();
    }
    let jobs = jobs.clamp(1, audio_refs.len());

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<(usize, String)>();
    for (index, audio_ref) in audio_refs.iter().enumerate() {
        work_tx
            .send((index, audio_ref.clone()))
            .expect("work queue receiver alive");
    }
    drop(work_tx);

    let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, BatchOutcome)>();
    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for (index, audio_ref) in work_rx.iter() {
                    let result = pipeline.process_call(&audio_ref);
                    if let Err(err) = &result {
                        tracing::warn!(audio_ref, error = %err, "call failed");
                    }
                    let _ = done_tx.send((index, BatchOutcome { audio_ref, result }));
                }
            });
        }
    });
    drop(done_tx);

    let mut slots: Vec<Option<BatchOutcome>> = audio_refs.iter().map(|_| None).collect();
    for (index, outcome) in done_rx.iter() {
        slots[index] = Some(outcome);
    }
    slots.into_iter().flatten().collect()
}
