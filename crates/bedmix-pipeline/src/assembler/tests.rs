use std::path::Path;
use std::sync::Arc;

use bedmix_core::{MixStage, MixerError, TrackKind, total_duration};

use super::*;
use crate::test_support::{FakeTranscoder, Fixture, MUSIC, SPEECH};

fn assembler(fx: &Fixture) -> ChunkAssembler {
    ChunkAssembler::new(
        fx.context(),
        fx.source.clone(),
        fx.transcoder.clone(),
        Arc::clone(&fx.config),
    )
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

#[tokio::test]
async fn test_collect_reaches_target_exactly() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.source
        .script(MUSIC, &[("a", 1200.0), ("b", 1200.0), ("c", 1200.0)]);
    let asm = assembler(&fx);

    let tracks = asm.collect(TrackKind::Music, 3600.0).await.unwrap();

    assert_eq!(tracks.len(), 3);
    assert!((total_duration(&tracks) - 3600.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_collect_requeues_item_past_early_stop() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.source.script(MUSIC, &[("long", 920.0)]);
    fx.source.script(MUSIC, &[("next", 500.0)]);
    let asm = assembler(&fx);

    let tracks = asm.collect(TrackKind::Music, 1000.0).await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].item_id, "long");
    let state = asm.ctx.lock().await;
    assert_eq!(state.queues.get(TrackKind::Music).front(), Some("next"));
}

#[tokio::test]
async fn test_pop_next_on_empty_source_is_exhausted() {
    let fx = Fixture::new(FakeTranscoder::new());
    let asm = assembler(&fx);

    let err = asm.pop_next(TrackKind::Speech).await.unwrap_err();
    assert_eq!(
        err,
        MixerError::QueueExhausted {
            kind: TrackKind::Speech
        }
    );
}

#[tokio::test]
async fn test_collect_on_exhausted_queue_records_error() {
    let fx = Fixture::new(FakeTranscoder::new());
    let asm = assembler(&fx);

    let tracks = asm.collect(TrackKind::Music, 100.0).await.unwrap();

    assert!(tracks.is_empty());
    let state = asm.ctx.lock().await;
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors.recent(1)[0].message.contains("music"));
}

#[tokio::test]
async fn test_collect_skips_short_and_unfetchable_tracks() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.source.script(MUSIC, &[("blip", 3.0)]);
    fx.source.script_unfetchable(MUSIC, &["gone"]);
    fx.source.script(MUSIC, &[("real", 150.0)]);
    let asm = assembler(&fx);

    let tracks = asm.collect(TrackKind::Music, 100.0).await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].item_id, "real");
    // The short download is removed as soon as it is rejected
    assert!(!asm.ctx.raw_dir().join("music_blip.mp3").exists());
    assert_eq!(file_count(asm.ctx.raw_dir()), 1);
}

#[tokio::test]
async fn test_assemble_builds_both_beds() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.script_both(2, 60.0);
    let asm = assembler(&fx);

    let beds = asm.assemble(1).await.unwrap();

    assert_eq!(beds.index, 1);
    assert_eq!(beds.tracks(TrackKind::Music).len(), 2);
    assert_eq!(beds.tracks(TrackKind::Speech).len(), 2);
    for kind in TrackKind::ALL {
        let content = std::fs::read_to_string(beds.bed(kind)).unwrap();
        assert_eq!(content.parse::<f64>().unwrap(), 120.0);
    }
    assert_eq!(beds.inputs()[0], beds.bed(TrackKind::Music));

    let state = asm.ctx.lock().await;
    assert_eq!(state.progress[&1].stage, MixStage::Concatenating);
}

#[tokio::test]
async fn test_assemble_with_empty_kind_removes_collected_tracks() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.source.script(MUSIC, &[("m1", 150.0)]);
    fx.source.script(SPEECH, &[]);
    let asm = assembler(&fx);

    let err = asm.assemble(1).await.unwrap_err();

    assert_eq!(
        err,
        MixerError::EmptyCollection {
            kind: TrackKind::Speech
        }
    );
    assert_eq!(file_count(asm.ctx.raw_dir()), 0);
}

#[tokio::test]
async fn test_assemble_concat_failure_cleans_up() {
    let transcoder = FakeTranscoder::new();
    transcoder.fail_concat();
    let fx = Fixture::new(transcoder);
    fx.script_both(1, 150.0);
    let asm = assembler(&fx);

    let err = asm.assemble(4).await.unwrap_err();

    assert!(matches!(
        err,
        MixerError::ConcatenationFailed {
            kind: TrackKind::Music,
            ..
        }
    ));
    assert_eq!(file_count(asm.ctx.raw_dir()), 0);
    assert_eq!(file_count(asm.ctx.chunk_dir()), 0);
}

#[tokio::test]
async fn test_cancelled_assembler_stops_without_leftovers() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.script_both(2, 150.0);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let asm = assembler(&fx).with_cancellation(cancel);

    let err = asm.assemble(1).await.unwrap_err();

    assert_eq!(err, MixerError::Stopped);
    assert_eq!(file_count(asm.ctx.raw_dir()), 0);
    assert_eq!(file_count(asm.ctx.chunk_dir()), 0);
    assert!(fx.transcoder.jobs().is_empty());
}

#[tokio::test]
async fn test_collect_aborts_on_source_error() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.source.script(MUSIC, &[("a", 150.0), ("b", 150.0)]);
    fx.source.fail_item("b", MixerError::internal("disk full"));
    let asm = assembler(&fx);

    let err = asm.collect(TrackKind::Music, 1000.0).await.unwrap_err();

    assert_eq!(err, MixerError::internal("disk full"));
    assert_eq!(file_count(asm.ctx.raw_dir()), 0);
}
