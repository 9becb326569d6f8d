//! End-to-end runs of the pipeline with stubbed providers.
//!
//! The transcoder is real when `ffmpeg` is on PATH; otherwise only the
//! stubbed-normalizer variants run.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tonetwist::audio::{AudioPayload, FfmpegNormalizer, MockNormalizer};
use tonetwist::rewrite::MockRewriter;
use tonetwist::stt::MockTranscriber;
use tonetwist::synth::{MockShape, MockSynthesizer};
use tonetwist::{AudioNormalizer, Pipeline, PipelineConfig, Stage, ToneTwistError};

fn ffmpeg_available() -> bool {
    let available = std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
        eprintln!("║  FFMPEG NOT FOUND: SKIPPING TRANSCODING END-TO-END TEST      ║");
        eprintln!("║                                                              ║");
        eprintln!("║  Install with:  sudo apt install ffmpeg                      ║");
        eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
    }
    available
}

fn silent_wav(seconds: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for _ in 0..(16000 * seconds) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.synthesis.api_keys = vec!["slot-1".into(), "slot-2".into(), "slot-3".into()];
    config.stream_timeout = Duration::from_secs(5);
    config
}

fn pipeline(normalizer: Arc<dyn AudioNormalizer>, synthesizer: Arc<MockSynthesizer>) -> Pipeline {
    Pipeline::new(
        normalizer,
        Arc::new(MockTranscriber::new().with_response("hello world")),
        Arc::new(MockRewriter::new().with_response("Arrr, hello world!")),
        synthesizer,
        config(),
    )
}

fn two_chunks(shape: MockShape) -> Arc<MockSynthesizer> {
    Arc::new(
        MockSynthesizer::new()
            .with_chunks([&b"ID3-part-one|"[..], &b"part-two"[..]])
            .with_shape(shape),
    )
}

#[tokio::test]
async fn test_pirate_run_with_stub_normalizer() {
    let synthesizer = two_chunks(MockShape::Chunks);
    let pipeline = pipeline(Arc::new(MockNormalizer::new()), synthesizer.clone());
    let payload = AudioPayload::new(silent_wav(3), "clip.wav");

    let output = pipeline.run(&payload, "pirate").await.unwrap();

    assert_eq!(output.transcript, "hello world");
    assert_eq!(output.styled_text, "Arrr, hello world!");
    assert_eq!(output.audio.bytes, b"ID3-part-one|part-two".to_vec());
    assert_eq!(output.audio.content_type, "audio/mpeg");

    let requests = synthesizer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "Arrr, hello world!");
    assert_eq!(requests[0].voice_id, "PPzYpIqttlTYA83688JI");
}

#[tokio::test]
async fn test_event_and_wrapped_streams_collect_identically() {
    for shape in [MockShape::Events, MockShape::Wrapped] {
        let pipeline = pipeline(Arc::new(MockNormalizer::new()), two_chunks(shape));
        let payload = AudioPayload::new(silent_wav(1), "clip.wav");

        let output = pipeline.run(&payload, "pirate").await.unwrap();

        assert_eq!(
            output.audio.bytes,
            b"ID3-part-one|part-two".to_vec(),
            "shape {shape:?}"
        );
    }
}

#[tokio::test]
async fn test_pirate_run_with_real_transcoder() {
    if !ffmpeg_available() {
        return;
    }
    let scratch = tempfile::tempdir().unwrap();
    let normalizer = FfmpegNormalizer::default().with_temp_root(scratch.path());
    let pipeline = pipeline(Arc::new(normalizer), two_chunks(MockShape::Chunks));
    let payload = AudioPayload::new(silent_wav(3), "clip.wav");

    let output = pipeline.run(&payload, "pirate").await.unwrap();

    assert_eq!(output.styled_text, "Arrr, hello world!");
    assert_eq!(output.audio.bytes, b"ID3-part-one|part-two".to_vec());
    let leftovers: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "scratch files left behind: {leftovers:?}");
}

#[tokio::test]
async fn test_overlong_wav_is_rejected_before_transcoding() {
    let normalizer = Arc::new(MockNormalizer::new());
    let pipeline = pipeline(normalizer.clone(), two_chunks(MockShape::Chunks));
    let payload = AudioPayload::new(silent_wav(61), "long.wav");

    let err = pipeline.run(&payload, "pirate").await.unwrap_err();

    assert_eq!(err.stage, Stage::Transcription);
    assert!(matches!(err.error, ToneTwistError::DurationExceeded { max_secs: 60 }));
    assert_eq!(err.status(), 400);
    assert_eq!(normalizer.calls(), 0);
}

#[tokio::test]
async fn test_unknown_style_fails_without_touching_providers() {
    let normalizer = Arc::new(MockNormalizer::new());
    let synthesizer = two_chunks(MockShape::Chunks);
    let pipeline = pipeline(normalizer.clone(), synthesizer.clone());
    let payload = AudioPayload::new(silent_wav(1), "clip.wav");

    let err = pipeline.run(&payload, "zombie").await.unwrap_err();

    assert_eq!(err.status(), 400);
    assert_eq!(
        err.to_response().error,
        "Enhancement failed: Invalid enhancement style selected."
    );
    assert_eq!(normalizer.calls(), 0);
    assert_eq!(synthesizer.calls(), 0);
}

#[tokio::test]
async fn test_stalled_stream_times_out_in_synthesis_stage() {
    let mut config = config();
    config.stream_timeout = Duration::from_millis(50);
    let pipeline = Pipeline::new(
        Arc::new(MockNormalizer::new()),
        Arc::new(MockTranscriber::new().with_response("hello world")),
        Arc::new(MockRewriter::new().with_response("Arrr, hello world!")),
        Arc::new(MockSynthesizer::new().with_shape(MockShape::Stalled)),
        config,
    );

    let err = pipeline.synthesize("hello", "robot").await.unwrap_err();

    assert_eq!(err.stage, Stage::Synthesis);
    assert!(matches!(err.error, ToneTwistError::Timeout { .. }));
}
