//! Lock-protected session handle.
//!
//! A [`PlaybackSession`] has no internal locking. When one thread controls
//! playback (start, seek, mute) while an audio callback on another thread
//! pulls samples, wrap the session in a [`SharedSession`].

use crate::session::PlaybackSession;
use parking_lot::Mutex;
use std::sync::Arc;

/// Session behind a `parking_lot` mutex.
pub type SharedSession = Arc<Mutex<PlaybackSession>>;

#[cfg(test)]
mod tests {
    use crate::builder::ImageBuilder;
    use crate::format::{Event, TrackHeader};
    use crate::session::PlaybackSession;
    use chiptrack_core::ChipKind;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_play_from_another_thread() {
        let mut builder = ImageBuilder::new(1000);
        builder.unit(ChipKind::Ym2149, 2_000_000);
        builder.track(
            TrackHeader {
                end_tick: 500,
                ..TrackHeader::default()
            },
            vec![Event::new(0, 0, 8, 0x0F)],
        );
        let mut session = PlaybackSession::open(builder.build(), 1000).unwrap();
        session.start(0).unwrap();
        let shared = session.into_shared();

        let audio = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let mut buffer = [0i16; 200];
            for _ in 0..10 {
                audio.lock().play(&mut buffer).unwrap();
            }
        });
        handle.join().unwrap();

        let session = shared.lock();
        assert!(session.ended());
        assert_eq!(session.played().as_millis(), 500);
    }
}
