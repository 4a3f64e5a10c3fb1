//! Tests for loading settings, override discovery and translation

use autoskip_config::{
    ConfigLocator, Error, KeyAccess, LibrarySnapshot, MappingTable, MediaServer, Namespace,
    Offsets, ScopeChain, Section, Settings, SkipMode,
};
use autoskip_test_utils::ConfigDir;
use serde_json::json;

fn load(dir: &ConfigDir) -> Settings {
    let locator = ConfigLocator::new(Some(dir.config_file().as_path())).with_env_override(None);
    Settings::load_with(locator).expect("settings should load")
}

mod flat_settings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = ConfigDir::new();

        let settings = load(&dir);

        dir.assert_file_exists("config.toml");
        assert_eq!(settings.flat().server.port, 32400);
        assert_eq!(settings.flat().skip.first_episode_series, SkipMode::Watched);
        let written = dir.read("config.toml");
        assert!(written.contains("Plex.tv"), "got:\n{written}");
        assert!(written.contains("custom-cascade = true"), "got:\n{written}");
    }

    #[test]
    fn backfill_keeps_operator_comments() {
        let dir = ConfigDir::new();
        dir.write_config("# my server\n[Server]\naddress = \"https://plex.lan/\" # home\n");

        let settings = load(&dir);

        assert_eq!(settings.flat().server.address, "plex.lan");
        let written = dir.read("config.toml");
        assert!(written.contains("# my server"));
        assert!(written.contains("# home"));
        assert!(written.contains("[Offsets]"));
    }

    #[test]
    fn complete_file_is_not_rewritten() {
        let dir = ConfigDir::new();
        load(&dir);
        let first = dir.read("config.toml");
        let with_comment = format!("# untouched\n{first}");
        dir.write_config(&with_comment);

        load(&dir);

        assert_eq!(dir.read("config.toml"), with_comment);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = ConfigDir::new();
        dir.write_config("[Server\nport = ");

        let locator = ConfigLocator::new(Some(dir.config_file().as_path())).with_env_override(None);
        let err = Settings::load_with(locator).unwrap_err();

        assert!(matches!(err, Error::FlatConfigParse { .. }));
    }

    #[test]
    fn cascade_flag_and_default_offsets_reach_resolver() {
        let dir = ConfigDir::new();
        dir.write_config("[Skip]\ncustom-cascade = \"no\"\n\n[Offsets]\nstart = 100\nend = 200\n");

        let settings = load(&dir);

        assert!(!settings.resolver().is_cascading());
        assert_eq!(
            settings.resolver().offsets(&ScopeChain::new(["nothing"])),
            Offsets::new(100, 200)
        );
    }
}

mod discovery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_override_files_synthesizes_default() {
        let dir = ConfigDir::new();

        let settings = load(&dir);

        dir.assert_file_exists("custom.json");
        assert_eq!(settings.override_files(), &[dir.path("custom.json")]);
        assert_eq!(
            dir.read_json("custom.json"),
            json!({
                "markers": {},
                "offsets": {},
                "allowed": { "users": [], "clients": [], "keys": [] },
                "blocked": { "users": [], "clients": [], "keys": [] },
                "clients": {}
            })
        );
    }

    #[test]
    fn files_merge_in_lexicographic_order() {
        let dir = ConfigDir::new();
        dir.write_override("custom.json", &json!({ "offsets": { "1": [1, 1] }, "allowed": { "users": ["c"] } }));
        dir.write_override("custom-a.json", &json!({ "offsets": { "1": [2, 2] }, "allowed": { "users": ["a"] } }));
        dir.write_override("custom-b.json", &json!({ "allowed": { "users": ["b"] } }));

        let settings = load(&dir);

        assert_eq!(
            settings.override_files(),
            &[dir.path("custom-a.json"), dir.path("custom-b.json"), dir.path("custom.json")]
        );
        assert_eq!(settings.overrides().allowed.users, vec!["a", "b", "c"]);
        assert_eq!(settings.overrides().offsets["1"], Offsets::new(1, 1));
    }

    #[test]
    fn malformed_file_falls_back_without_being_overwritten() {
        let dir = ConfigDir::new();
        dir.write_raw("custom.json", "{ this is not json");
        dir.write_override("custom-extra.json", &json!({ "blocked": { "users": ["eve"] } }));

        let settings = load(&dir);

        assert_eq!(settings.overrides().blocked.users, vec!["eve"]);
        assert_eq!(dir.read("custom.json"), "{ this is not json");
    }

    #[test]
    fn fractional_marker_does_not_discard_file() {
        let dir = ConfigDir::new();
        dir.write_override(
            "custom.json",
            &json!({
                "markers": { "101": [{ "start": 1000.5, "end": 2000 }] },
                "offsets": { "102": [1, 2] }
            }),
        );

        let settings = load(&dir);

        assert_eq!(settings.overrides().offsets["102"], Offsets::new(1, 2));
        assert_eq!(settings.overrides().markers["101"].len(), 1);
    }

    #[test]
    fn wrong_shape_falls_back_to_defaults() {
        let dir = ConfigDir::new();
        dir.write_override("custom.json", &json!({ "offsets": { "1": "soon" } }));

        let settings = load(&dir);

        assert!(settings.overrides().offsets.is_empty());
    }

    #[test]
    fn partial_file_is_backfilled_on_disk() {
        let dir = ConfigDir::new();
        dir.write_override("custom.json", &json!({ "allowed": { "users": ["a"] } }));

        load(&dir);

        let written = dir.read_json("custom.json");
        assert_eq!(written["allowed"], json!({ "users": ["a"], "clients": [], "keys": [] }));
        assert_eq!(written["markers"], json!({}));
        assert_eq!(written["clients"], json!({}));
    }

    #[test]
    fn reload_picks_up_new_files() {
        let dir = ConfigDir::new();
        let settings = load(&dir);
        dir.write_override("custom-late.json", &json!({ "blocked": { "keys": ["5"] } }));

        let reloaded = settings.reload().unwrap();

        assert!(settings.overrides().blocked.keys.is_empty());
        assert_eq!(reloaded.overrides().blocked.keys, vec!["5"]);
        assert_eq!(
            reloaded.resolver().key_access(&ScopeChain::new(["5"])),
            KeyAccess::Blocked
        );
    }
}

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_match_example() {
        let dir = ConfigDir::new();
        dir.write_config("[Skip]\ncustom-cascade = false\n");
        dir.write_override(
            "custom.json",
            &json!({ "offsets": { "item1": [1000, 2000], "seasonA": [500, 500] } }),
        );

        let settings = load(&dir);
        let resolver = settings.resolver();

        assert_eq!(
            resolver
                .resolve(Section::Offsets, &ScopeChain::new(["item1", "seasonA", "global"]))
                .unwrap(),
            json!([1000, 2000])
        );
        assert_eq!(
            resolver
                .resolve(Section::Offsets, &ScopeChain::new(["item2", "seasonA", "global"]))
                .unwrap(),
            json!([500, 500])
        );
    }

    #[test]
    fn scope_chain_from_snapshot_drives_resolution() {
        let dir = ConfigDir::new();
        dir.write_override(
            "custom.json",
            &json!({ "markers": { "200": [{ "start": 0, "end": 90000, "mode": "skip" }] } }),
        );
        let snapshot = dir.write_snapshot(
            "library.json",
            &[("101", "plex://episode/e", Some("200")), ("200", "plex://season/s", None)],
        );

        let settings = load(&dir);
        let server = LibrarySnapshot::load(&snapshot).unwrap();
        let chain = server.scope_chain("101").unwrap();

        let markers = settings.resolver().markers(&chain);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].mode.as_deref(), Some("skip"));
    }
}

mod translation {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Unreachable;

    impl MediaServer for Unreachable {
        fn mapping_table(&self) -> autoskip_config::Result<MappingTable> {
            Err(Error::server("connection refused"))
        }

        fn scope_chain(&self, _item: &str) -> autoskip_config::Result<ScopeChain> {
            Err(Error::server("connection refused"))
        }
    }

    fn library(dir: &ConfigDir) -> LibrarySnapshot {
        let path = dir.write_snapshot(
            "library.json",
            &[
                ("101", "plex://episode/a", Some("200")),
                ("102", "plex://episode/b", Some("200")),
                ("200", "plex://season/s", None),
            ],
        );
        LibrarySnapshot::load(&path).unwrap()
    }

    #[test]
    fn each_file_is_translated_and_saved_separately() {
        let dir = ConfigDir::new();
        dir.write_override("custom.json", &json!({ "offsets": { "101": [1, 2] } }));
        dir.write_override("custom-shared.json", &json!({ "blocked": { "keys": ["200", "777"] } }));
        let server = library(&dir);

        let settings = load(&dir);
        let report = settings.replace_with_guids(&server).unwrap();

        assert_eq!(report.target, Namespace::Guid);
        assert_eq!(report.files.len(), 2);
        assert!(report.all_persisted());
        assert_eq!(report.unresolved().into_iter().collect::<Vec<_>>(), vec!["777"]);

        assert_eq!(dir.read_json("custom.json")["offsets"], json!({ "plex://episode/a": [1, 2] }));
        assert_eq!(
            dir.read_json("custom-shared.json")["blocked"]["keys"],
            json!(["plex://season/s", "777"])
        );
        assert_eq!(dir.read_json("custom-shared.json")["offsets"], json!({}));
    }

    #[test]
    fn malformed_file_is_skipped_not_overwritten() {
        let dir = ConfigDir::new();
        let broken = r#"{ "offsets": { "101": [1, 2] }, oops"#;
        dir.write_raw("custom.json", broken);
        dir.write_override("custom-extra.json", &json!({ "offsets": { "102": [3, 4] } }));
        let server = library(&dir);

        let settings = load(&dir);
        let report = settings.replace_with_guids(&server).unwrap();

        assert_eq!(dir.read("custom.json"), broken);
        let broken_path = dir.path("custom.json");
        let skipped: Vec<_> = report.files.iter().filter(|f| f.skipped).map(|f| &f.path).collect();
        assert_eq!(skipped, vec![&broken_path]);
        assert!(report.all_persisted());
        assert_eq!(
            dir.read_json("custom-extra.json")["offsets"],
            json!({ "plex://episode/b": [3, 4] })
        );
    }

    #[test]
    fn guids_and_back_restores_files() {
        let dir = ConfigDir::new();
        dir.write_override(
            "custom.json",
            &json!({
                "markers": { "102": [{ "start": 10, "end": 20 }] },
                "allowed": { "users": ["amy"], "keys": ["200"] }
            }),
        );
        let server = library(&dir);
        let settings = load(&dir);
        let before = dir.read_json("custom.json");

        settings.replace_with_guids(&server).unwrap();
        let reloaded = settings.reload().unwrap();
        assert!(reloaded.overrides().markers.contains_key("plex://episode/b"));

        let back = reloaded.replace_with_rating_keys(&server).unwrap();
        assert!(back.unresolved().is_empty());
        assert_eq!(dir.read_json("custom.json"), before);
    }

    #[test]
    fn unreachable_server_touches_nothing() {
        let dir = ConfigDir::new();
        dir.write_override("custom.json", &json!({ "offsets": { "101": [1, 2] } }));
        let settings = load(&dir);
        let before = dir.read("custom.json");

        let err = settings.replace_with_guids(&Unreachable).unwrap_err();

        assert!(matches!(err, Error::Server { .. }));
        assert_eq!(dir.read("custom.json"), before);
    }

    #[test]
    fn missing_snapshot_is_a_server_error() {
        let dir = ConfigDir::new();
        let err = LibrarySnapshot::load(&dir.path("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Server { .. }));
    }
}
