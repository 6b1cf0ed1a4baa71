//! Session lifecycle, rendering and error behavior through the public API.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use chiptrack::{
    Error, Event, ImageBuilder, PlaybackSession, SessionConfig, TrackHeader, TrackImage,
};
use chiptrack_core::ChipKind;

const SAMPLE_RATE: u32 = 44_100;
const WAVE_CLOCK: u32 = 3_579_545;

/// Square wave on wavetable voice 0 from tick 0.
fn square_wave_events() -> Vec<Event> {
    let mut events: Vec<Event> = (0..32u16)
        .map(|i| Event::new(0, 0, i, if i < 16 { 0x40 } else { 0xC0 }))
        .collect();
    events.push(Event::new(0, 0, 0x80, 0xFF));
    events.push(Event::new(0, 0, 0x8A, 0x0F));
    events.push(Event::new(0, 0, 0x8F, 0x01));
    events
}

fn wave_image(header: TrackHeader, events: Vec<Event>) -> Vec<u8> {
    let mut builder = ImageBuilder::new(1000);
    builder.unit(ChipKind::Wavetable, WAVE_CLOCK);
    builder.track(header, events);
    builder.build()
}

fn audible_image(end_tick: u32) -> Vec<u8> {
    wave_image(
        TrackHeader {
            end_tick,
            song: "Square".into(),
            ..TrackHeader::default()
        },
        square_wave_events(),
    )
}

fn render(session: &mut PlaybackSession, frames: usize) -> Vec<i16> {
    let mut buffer = vec![0i16; frames * 2];
    session.play(&mut buffer).unwrap();
    buffer
}

#[test]
fn register_write_lands_at_its_frame() {
    let image = wave_image(
        TrackHeader {
            end_tick: 200,
            ..TrackHeader::default()
        },
        vec![Event::new(0, 0, 0, 0x80), Event::new(100, 0, 1, 0x40)],
    );
    let mut session = PlaybackSession::open(image, SAMPLE_RATE).unwrap();
    session.start(0).unwrap();

    let chip = session.chip(0).unwrap();
    assert_eq!(chip.read_register(0), Some(0x80));
    assert_eq!(chip.read_register(1), Some(0x00));

    // Tick 100 at 1000 ticks/s is frame 4410
    render(&mut session, 4409);
    assert_eq!(session.chip(0).unwrap().read_register(1), Some(0x00));
    render(&mut session, 1);
    assert_eq!(session.chip(0).unwrap().read_register(1), Some(0x40));
    assert!(!session.ended());
}

#[test]
fn rendering_is_reproducible() {
    let image = audible_image(500);
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let mut session = PlaybackSession::open(image.clone(), SAMPLE_RATE).unwrap();
        session.start(0).unwrap();
        outputs.push(render(&mut session, 4410));
    }
    assert_eq!(outputs[0], outputs[1]);
    assert!(outputs[0].iter().any(|&s| s != 0));
}

#[test]
fn restart_reproduces_output() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    let first = render(&mut session, 2000);
    session.start(0).unwrap();
    let second = render(&mut session, 2000);
    assert_eq!(first, second);
}

#[test]
fn buffer_split_does_not_change_output() {
    let image = audible_image(500);
    let mut whole = PlaybackSession::open(image.clone(), SAMPLE_RATE).unwrap();
    whole.start(0).unwrap();
    let expected = render(&mut whole, 3000);

    let mut split = PlaybackSession::open(image, SAMPLE_RATE).unwrap();
    split.start(0).unwrap();
    let mut actual = Vec::new();
    for frames in [1, 999, 7, 1993] {
        actual.extend(render(&mut split, frames));
    }
    assert_eq!(actual, expected);
}

#[test]
fn track_ends_after_its_length() {
    for rate in [22_050, 44_100, 48_000] {
        let length_ms = 1234u32;
        let image = wave_image(
            TrackHeader {
                length_ms: length_ms as i32,
                end_tick: length_ms,
                ..TrackHeader::default()
            },
            square_wave_events(),
        );
        let mut session = PlaybackSession::open(image, rate).unwrap();
        session.start(0).unwrap();

        let total = (u64::from(length_ms) * u64::from(rate) / 1000) as usize;
        let mut done = 0;
        while done < total - 1 {
            let frames = (total - 1 - done).min(512);
            render(&mut session, frames);
            done += frames;
        }
        assert!(!session.ended(), "ended early at {rate} Hz");
        render(&mut session, 1);
        assert!(session.ended(), "still playing at {rate} Hz");
        assert_relative_eq!(
            session.played().as_secs_f64(),
            total as f64 / f64::from(rate),
            epsilon = 1e-6
        );

        let tail = render(&mut session, 64);
        assert!(tail.iter().all(|&s| s == 0));
    }
}

#[test]
fn declared_length_ends_track_without_end_tick() {
    let image = wave_image(
        TrackHeader {
            length_ms: 1000,
            end_tick: 0,
            ..TrackHeader::default()
        },
        square_wave_events(),
    );
    let mut session = PlaybackSession::open(image, 1000).unwrap();
    session.start(0).unwrap();
    assert!(!session.ended());
    render(&mut session, 999);
    assert!(!session.ended());
    render(&mut session, 1);
    assert!(session.ended());
    assert_eq!(session.played(), Duration::from_secs(1));
}

#[test]
fn open_rejects_end_tick_beyond_length() {
    let image = wave_image(
        TrackHeader {
            length_ms: 1000,
            end_tick: 5000,
            ..TrackHeader::default()
        },
        square_wave_events(),
    );
    assert!(matches!(
        PlaybackSession::open(image, SAMPLE_RATE),
        Err(Error::BadMetadata { .. })
    ));
}

#[test]
fn played_counts_rendered_time() {
    let mut session = PlaybackSession::open(audible_image(5000), SAMPLE_RATE).unwrap();
    assert_eq!(session.played(), Duration::ZERO);
    session.start(0).unwrap();
    render(&mut session, 22_050);
    assert_eq!(session.played(), Duration::from_millis(500));
}

#[test]
fn seek_lands_on_target() {
    let mut session = PlaybackSession::open(audible_image(5000), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    session.seek(Duration::from_millis(1500)).unwrap();
    assert_eq!(session.played(), Duration::from_millis(1500));

    // Backwards
    session.seek(Duration::from_millis(250)).unwrap();
    assert_eq!(session.played(), Duration::from_millis(250));
    assert!(!session.ended());
}

#[test]
fn seek_matches_continuous_playback() {
    let image = audible_image(5000);
    let mut continuous = PlaybackSession::open(image.clone(), SAMPLE_RATE).unwrap();
    continuous.start(0).unwrap();
    render(&mut continuous, 4410);
    let expected = render(&mut continuous, 1000);

    let mut seeking = PlaybackSession::open(image, SAMPLE_RATE).unwrap();
    seeking.start(0).unwrap();
    seeking.seek(Duration::from_millis(100)).unwrap();
    assert_eq!(render(&mut seeking, 1000), expected);
}

#[test]
fn seek_past_end_ends_track() {
    let mut session = PlaybackSession::open(audible_image(100), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    session.seek(Duration::from_secs(10)).unwrap();
    assert!(session.ended());
}

#[test]
fn muted_voice_is_silent() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    assert_eq!(session.voice_count(), 5);
    session.mute_voice(0, true).unwrap();
    session.start(0).unwrap();
    assert!(render(&mut session, 2000).iter().all(|&s| s == 0));

    session.mute_voice(0, false).unwrap();
    assert!(render(&mut session, 2000).iter().any(|&s| s != 0));
    assert!(session.muted_voices().is_empty());
}

#[test]
fn odd_buffer_tail_is_zeroed() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    let mut buffer = [i16::MAX; 301];
    session.play(&mut buffer).unwrap();
    assert_eq!(buffer[300], 0);
}

#[test]
fn shared_image_drives_independent_sessions() {
    let image = Arc::new(TrackImage::parse(audible_image(500)).unwrap());
    let mut first =
        PlaybackSession::with_image(Arc::clone(&image), SAMPLE_RATE, SessionConfig::default())
            .unwrap();
    let mut second =
        PlaybackSession::with_image(Arc::clone(&image), SAMPLE_RATE, SessionConfig::default())
            .unwrap();
    first.start(0).unwrap();
    second.start(0).unwrap();

    let a = render(&mut first, 1000);
    first.close();
    let b = render(&mut second, 1000);
    assert_eq!(a, b);
    assert_eq!(Arc::strong_count(&image), 2);
}

#[test]
fn track_metadata_is_exposed() {
    let session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    assert_eq!(session.track_count(), 1);
    let info = session.track_info(0).unwrap();
    assert_eq!(info.song, "Square");
    assert_eq!(info.end_tick, 500);
    assert!(matches!(
        session.track_info(1),
        Err(Error::InvalidTrack { index: 1, count: 1 })
    ));
}

#[test]
fn failed_start_keeps_current_track() {
    let mut session = PlaybackSession::open(audible_image(5000), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    render(&mut session, 441);
    let before = session.played();

    assert!(matches!(
        session.start(7),
        Err(Error::InvalidTrack { index: 7, count: 1 })
    ));
    assert_eq!(session.current_track(), Some(0));
    assert_eq!(session.played(), before);
    render(&mut session, 441);
    assert!(session.played() > before);
}

#[test]
fn malformed_track_fails_at_start() {
    let image = wave_image(
        TrackHeader::default(),
        vec![Event::new(10, 0, 0, 1), Event::new(5, 0, 0, 1)],
    );
    let mut session = PlaybackSession::open(image, SAMPLE_RATE).unwrap();
    assert!(matches!(
        session.start(0),
        Err(Error::MalformedEvents { track: 0, .. })
    ));
    assert_eq!(session.current_track(), None);
}

#[test]
fn play_before_start_is_not_started() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    let mut buffer = [0i16; 64];
    assert!(matches!(session.play(&mut buffer), Err(Error::NotStarted)));
    assert!(matches!(
        session.seek(Duration::from_millis(10)),
        Err(Error::NotStarted)
    ));
    assert!(!session.ended());
}

#[test]
fn closed_session_rejects_calls() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    session.start(0).unwrap();
    session.close();
    session.close();

    assert!(session.is_closed());
    assert!(session.ended());
    assert_eq!(session.track_count(), 0);
    assert_eq!(session.warning(), "");
    let mut buffer = [0i16; 64];
    assert!(matches!(session.play(&mut buffer), Err(Error::ClosedSession)));
    assert!(matches!(session.start(0), Err(Error::ClosedSession)));
    assert!(matches!(session.track_info(0), Err(Error::ClosedSession)));
}

#[test]
fn tolerated_write_leaves_warning() {
    let mut events = square_wave_events();
    events.push(Event::new(0, 0, 0xE0, 0x01));
    let image = wave_image(
        TrackHeader {
            end_tick: 100,
            ..TrackHeader::default()
        },
        events,
    );
    let mut session = PlaybackSession::open(image, SAMPLE_RATE).unwrap();
    assert_eq!(session.warning(), "");
    session.start(0).unwrap();

    let warning = session.warning();
    assert!(warning.contains("0xe0"), "unexpected warning {warning:?}");
    assert_eq!(session.warning(), "");
}

#[test]
fn invalid_sample_rate_is_rejected() {
    assert!(matches!(
        PlaybackSession::open(audible_image(100), 0),
        Err(Error::InvalidSampleRate(0))
    ));
}

#[test]
fn open_propagates_parse_errors() {
    assert!(matches!(
        PlaybackSession::open(b"garbage!".to_vec(), SAMPLE_RATE),
        Err(Error::BadMagic)
    ));
}

#[test]
fn tempo_changes_track_duration() {
    let mut session = PlaybackSession::open(audible_image(1000), SAMPLE_RATE).unwrap();
    session.set_tempo(200).unwrap();
    session.start(0).unwrap();
    render(&mut session, 22_049);
    assert!(!session.ended());
    render(&mut session, 1);
    assert!(session.ended());

    assert!(matches!(session.set_tempo(0), Err(Error::InvalidConfig { .. })));
}

#[test]
fn zero_stereo_depth_is_mono() {
    let mut session = PlaybackSession::open(audible_image(500), SAMPLE_RATE).unwrap();
    session.set_stereo_depth(0.0).unwrap();
    session.start(0).unwrap();
    let output = render(&mut session, 2000);
    assert!(output.chunks_exact(2).all(|pair| pair[0] == pair[1]));
    assert!(output.iter().any(|&s| s != 0));
    assert!(session.set_stereo_depth(1.5).is_err());
}
