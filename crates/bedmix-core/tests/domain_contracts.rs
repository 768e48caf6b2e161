//! Public API contracts of the core crate.

use bedmix_core::{
    ChunkDescriptor, MixTier, MixerSettings, PlaylistRef, SessionId, StorageLayout, load_settings,
    save_settings, validate_settings,
};
use tempfile::TempDir;

#[test]
fn session_id_matches_normalized_and_raw_refs_independently() {
    // Ids hash the refs as given, so a bare id and its URL are different sessions.
    let bare = SessionId::from_playlists("PLm", "PLs");
    let url = SessionId::from_playlists(PlaylistRef::new("PLm").url(), PlaylistRef::new("PLs").url());
    assert_ne!(bare, url);
}

#[test]
fn layout_places_tier_files_in_session_chunk_dir() {
    let layout = StorageLayout::new("/data");
    let sid = SessionId::from_playlists("m", "s");
    let chunk = ChunkDescriptor::new(
        4,
        layout.chunk_dir(&sid).join(MixTier::Quick.file_name(4)),
        MixTier::Quick,
    );

    assert!(chunk.path().starts_with("/data/mixed_chunks"));
    assert!(chunk.path().ends_with("4_quick.mp3"));
}

#[test]
fn settings_round_trip_through_data_root() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());

    let mut settings = MixerSettings::with_defaults();
    settings.lookahead_depth = Some(3);
    settings.default_speech_playlist = Some("PLspeech".into());
    validate_settings(&settings).unwrap();

    save_settings(&layout.config_path(), &settings).unwrap();
    let loaded = load_settings(&layout.config_path());

    assert_eq!(loaded.effective_lookahead_depth(), 3);
    assert_eq!(loaded.default_speech_playlist.as_deref(), Some("PLspeech"));
}
