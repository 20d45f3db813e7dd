//! Boot dispatch: turn an identified image into a delegated load.
//!
//! ```text
//! ┌───────────────────────────┬──────────────────────────────────────────┐
//! │ kind                      │ outcome                                  │
//! ├───────────────────────────┼──────────────────────────────────────────┤
//! │ ContainerInDirectory      │ resolve EBOOT.PBP, re-identify, then     │
//! │                           │ disc load (NP) or executable load        │
//! │ Container / Executable    │ executable load                          │
//! │ DiscImage / NpDiscImage / │ start in disc0:/PSP_GAME/USRDIR,         │
//! │ DiscDirectory             │ disc load                                │
//! │ TraceDump                 │ trace replay                             │
//! │ anything else             │ BootError                                │
//! └───────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Any failure leaves the core in [`CoreState::BootError`] and drops the
//! layer. On success the delegated loader owns it.

use super::resolve::resolve_target;
use super::session::Session;
use crate::access::{AccessLayer, BoxedAccess};
use crate::diagnostic::{BootError, IdentifyError};
use crate::host::{CoreState, DISC_START_DIR, MEMSTICK_ROOT};
use crate::identify::{GAME_DIR_MARKER, GameImageKind, identify};
use crate::locator::Locator;

impl Session {
    /// Identify `access` and hand it to the matching loader.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let access = session.open(&Locator::parse(path));
    /// if let Err(e) = session.load_file(access) {
    ///     show_error(&e.to_string());
    /// }
    /// ```
    pub fn load_file(&mut self, access: BoxedAccess) -> Result<(), BootError> {
        self.state = CoreState::Booting;
        let result = self.dispatch(access);
        match &result {
            Ok(()) => self.state = CoreState::Running,
            Err(e) => {
                log::error!("boot failed: {e}");
                self.state = CoreState::BootError;
            }
        }
        result
    }

    fn dispatch(&mut self, access: BoxedAccess) -> Result<(), BootError> {
        let kind = match identify(access.as_ref()) {
            Ok(kind) => kind,
            Err(e) => return Err(identify_failure(e, access.as_ref())),
        };
        log::debug!("{} identified as {kind}", access.locator());

        match kind {
            GameImageKind::ContainerInDirectory => self.load_game_directory(access),
            GameImageKind::Container | GameImageKind::Executable => {
                log::info!("File is an ELF or loose PBP");
                self.load_executable(access)
            }
            GameImageKind::DiscImage | GameImageKind::NpDiscImage | GameImageKind::DiscDirectory => {
                self.load_disc(access)
            }
            GameImageKind::TraceDump => self.loader.load_trace_dump(access).map_err(loader_failure),
            GameImageKind::Ps1Container => Err(BootError::Ps1Unsupported),
            GameImageKind::Mode2Disc => Err(BootError::NonPspDisc),
            GameImageKind::PlainDirectory => Err(BootError::PlainDirectory),
            GameImageKind::SaveState => Err(BootError::SaveState),
            GameImageKind::SaveDataDirectory => Err(BootError::SaveData),
            GameImageKind::ZipArchive
            | GameImageKind::RarArchive
            | GameImageKind::SevenZipArchive
            | GameImageKind::Unknown
            | GameImageKind::UnknownBinary
            | GameImageKind::UnrecognizedExecutable => {
                Err(BootError::archive(kind).unwrap_or_else(|| BootError::UnknownFileType {
                    path: access.locator().to_string(),
                }))
            }
        }
    }

    fn load_game_directory(&mut self, access: BoxedAccess) -> Result<(), BootError> {
        let access = resolve_target(&self.chain(), access);
        if !access.exists() {
            return Err(BootError::MisidentifiedGame);
        }
        log::info!("File is a PBP in a directory");

        match identify(access.as_ref()) {
            Ok(GameImageKind::NpDiscImage) => return self.load_disc(access),
            Ok(GameImageKind::Ps1Container) => return Err(BootError::Ps1Unsupported),
            Err(e) => return Err(identify_failure(e, access.as_ref())),
            Ok(_) => {}
        }

        if let Some(dir) = memstick_start_dir(access.locator()) {
            self.vfs.set_starting_directory(&dir);
        }
        self.load_executable(access)
    }

    fn load_disc(&mut self, access: BoxedAccess) -> Result<(), BootError> {
        self.vfs.set_starting_directory(DISC_START_DIR);
        self.loader.load_disc_image(access).map_err(loader_failure)
    }

    fn load_executable(&mut self, access: BoxedAccess) -> Result<(), BootError> {
        self.loader.load_executable(access).map_err(loader_failure)
    }
}

/// `ms0:/PSP/GAME/<title>` for an EBOOT installed on the memory stick.
fn memstick_start_dir(eboot: &Locator) -> Option<String> {
    let dir = eboot.parent().normalized();
    let pos = dir.find(GAME_DIR_MARKER)?;
    Some(format!("{MEMSTICK_ROOT}{}", &dir[pos..]))
}

fn identify_failure(identify: IdentifyError, layer: &dyn AccessLayer) -> BootError {
    BootError::Identify {
        identify,
        io_error: layer.latest_error(),
    }
}

fn loader_failure(message: String) -> BootError {
    BootError::Loader { message }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::super::session::testing::{Fakes, fake_session};
    use super::*;
    use crate::access::LocalAccess;
    use crate::access::testing::FakeAccess;
    use crate::identify::{MODE2_SYNC, RAW_SECTOR_SIZE, SfoValue, build_pbp, build_sfo};
    use tempfile::TempDir;

    fn boxed(layer: FakeAccess) -> BoxedAccess {
        Box::new(layer)
    }

    fn pbp(category: &str, psar: &[u8]) -> Vec<u8> {
        build_pbp(&build_sfo(&[("CATEGORY", SfoValue::Text(category.into()))]), psar)
    }

    #[test]
    fn test_disc_image_boots() {
        let (mut session, log) = fake_session(Fakes::default());
        let result = session.load_file(boxed(FakeAccess::new("/g/game.iso", vec![0; 2048])));
        assert_eq!(result, Ok(()));
        assert_eq!(session.core_state(), CoreState::Running);
        let log = log.lock();
        assert_eq!(log.starting_dir.as_deref(), Some(DISC_START_DIR));
        assert_eq!(log.disc_loads, ["/g/game.iso"]);
    }

    #[test]
    fn test_loose_container_boots_as_executable() {
        let (mut session, log) = fake_session(Fakes::default());
        let result = session.load_file(boxed(FakeAccess::new("/g/EBOOT.PBP", pbp("UG", b""))));
        assert_eq!(result, Ok(()));
        assert_eq!(log.lock().executable_loads, ["/g/EBOOT.PBP"]);
        assert!(log.lock().starting_dir.is_none());
    }

    #[test]
    fn test_trace_dump_replays() {
        let (mut session, log) = fake_session(Fakes::default());
        let result = session.load_file(boxed(FakeAccess::new("/t.ppdmp", b"PPSSPPGE".to_vec())));
        assert_eq!(result, Ok(()));
        assert_eq!(log.lock().trace_loads, ["/t.ppdmp"]);
    }

    #[test]
    fn test_rar_fails_without_reading_further() {
        let (mut session, log) = fake_session(Fakes::default());
        let rar = FakeAccess::new("/g/game.rar", b"Rar!\x1a\x07\x00".repeat(64));
        let reads = std::sync::Arc::new(rar);
        // Keep a handle on the fake to inspect reads after dispatch.
        let shared = reads.clone();
        let layer: BoxedAccess = Box::new(SharedFake(reads));

        let err = session.load_file(layer).unwrap_err();
        assert!(matches!(err, BootError::Archive { format: "RAR", .. }));
        assert!(err.to_string().contains("Require"));
        assert_eq!(session.core_state(), CoreState::BootError);
        assert_eq!(shared.reads(), 1);
        assert!(log.lock().disc_loads.is_empty());
    }

    #[test]
    fn test_rejections() {
        let cases: Vec<(FakeAccess, BootError)> = vec![
            (FakeAccess::new("/a.zip", b"PK\x03\x04".to_vec()), BootError::archive(GameImageKind::ZipArchive).unwrap()),
            (FakeAccess::new("/a.7z", b"7z\xBC\xAF".to_vec()), BootError::archive(GameImageKind::SevenZipArchive).unwrap()),
            (FakeAccess::new("/a.ppst", Vec::new()), BootError::SaveState),
            (FakeAccess::new("/a.pbp", pbp("ME", b"")), BootError::Ps1Unsupported),
            (
                FakeAccess::new("/a.txt", b"hello".to_vec()),
                BootError::UnknownFileType { path: "/a.txt".into() },
            ),
            (
                FakeAccess::new("/a.so", b"\x7FELF".to_vec()),
                BootError::UnknownFileType { path: "/a.so".into() },
            ),
        ];
        for (layer, expected) in cases {
            let (mut session, log) = fake_session(Fakes::default());
            assert_eq!(session.load_file(boxed(layer)), Err(expected));
            assert_eq!(session.core_state(), CoreState::BootError);
            assert!(log.lock().executable_loads.is_empty());
        }
    }

    #[test]
    fn test_mode2_disc_rejected() {
        let mut raw = MODE2_SYNC.to_vec();
        raw.resize(RAW_SECTOR_SIZE as usize, 0);
        let (mut session, _) = fake_session(Fakes::default());
        let err = session.load_file(boxed(FakeAccess::new("/psx.iso", raw))).unwrap_err();
        assert_eq!(err, BootError::NonPspDisc);
        assert_eq!(err.to_string(), "PSX game image detected.");
    }

    #[test]
    fn test_directories_rejected() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("plain");
        let save = tmp.path().join("SAVEDATA");
        fs::create_dir(&plain).unwrap();
        fs::create_dir(&save).unwrap();
        fs::write(save.join("PARAM.SFO"), b"").unwrap();

        let (mut session, _) = fake_session(Fakes::default());
        let open = |p: &std::path::Path| -> BoxedAccess {
            Box::new(LocalAccess::new(Locator::local(p.to_string_lossy())))
        };
        assert_eq!(session.load_file(open(&plain)), Err(BootError::PlainDirectory));
        assert_eq!(session.load_file(open(&save)), Err(BootError::SaveData));
    }

    #[test]
    fn test_identify_error_carries_io_error() {
        let (mut session, _) = fake_session(Fakes::default());
        let layer = FakeAccess::new("/a.bin", b"data".to_vec()).failing(1);
        let err = session.load_file(boxed(layer)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to read identification bytes: simulated read failure"
        );
        assert_eq!(session.core_state(), CoreState::BootError);
    }

    #[test]
    fn test_loader_failure_is_boot_error() {
        let (mut session, _) = fake_session(Fakes {
            loader_rejects: Some("bad ELF header".into()),
            ..Fakes::default()
        });
        let err = session
            .load_file(boxed(FakeAccess::new("/a.elf", b"\x7FELF".to_vec())))
            .unwrap_err();
        assert_eq!(err.to_string(), "bad ELF header");
        assert_eq!(session.core_state(), CoreState::BootError);
    }

    #[test]
    fn test_game_directory_boots_eboot() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("PSP").join("GAME").join("DEMO");
        fs::create_dir_all(&game).unwrap();
        fs::write(game.join("EBOOT.PBP"), pbp("UG", b"")).unwrap();

        let (mut session, log) = fake_session(Fakes::default());
        let dir: BoxedAccess = Box::new(LocalAccess::new(Locator::local(game.to_string_lossy())));
        assert_eq!(session.load_file(dir), Ok(()));

        let log = log.lock();
        assert_eq!(log.starting_dir.as_deref(), Some("ms0:/PSP/GAME/DEMO"));
        assert_eq!(log.executable_loads.len(), 1);
        assert!(log.executable_loads[0].ends_with("EBOOT.PBP"));
    }

    #[test]
    fn test_game_directory_with_np_eboot_boots_disc() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("PSP").join("GAME").join("NPUZ00001");
        fs::create_dir_all(&game).unwrap();
        fs::write(game.join("EBOOT.PBP"), pbp("EG", b"NPUMDIMG")).unwrap();

        let (mut session, log) = fake_session(Fakes::default());
        let dir: BoxedAccess = Box::new(LocalAccess::new(Locator::local(game.to_string_lossy())));
        assert_eq!(session.load_file(dir), Ok(()));
        assert_eq!(log.lock().starting_dir.as_deref(), Some(DISC_START_DIR));
        assert_eq!(log.lock().disc_loads.len(), 1);
    }

    #[test]
    fn test_game_directory_with_ps1_eboot_rejected() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("PSP").join("GAME").join("SLUS00001");
        fs::create_dir_all(&game).unwrap();
        fs::write(game.join("EBOOT.PBP"), pbp("ME", b"PSISOIMG0000")).unwrap();

        let (mut session, _) = fake_session(Fakes::default());
        let dir: BoxedAccess = Box::new(LocalAccess::new(Locator::local(game.to_string_lossy())));
        assert_eq!(session.load_file(dir), Err(BootError::Ps1Unsupported));
    }

    #[test]
    fn test_memstick_start_dir() {
        assert_eq!(
            memstick_start_dir(&Locator::local("C:\\ms0\\PSP\\GAME\\DEMO\\EBOOT.PBP")).as_deref(),
            Some("ms0:/PSP/GAME/DEMO")
        );
        assert_eq!(memstick_start_dir(&Locator::local("/games/EBOOT.PBP")), None);
    }

    /// Shares one fake between the session and the test.
    struct SharedFake(std::sync::Arc<FakeAccess>);

    impl AccessLayer for SharedFake {
        fn exists(&self) -> bool {
            self.0.exists()
        }

        fn is_directory(&self) -> bool {
            self.0.is_directory()
        }

        fn size(&self) -> u64 {
            self.0.size()
        }

        fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
            self.0.read_at(offset, len)
        }

        fn locator(&self) -> &Locator {
            self.0.locator()
        }

        fn latest_error(&self) -> Option<String> {
            self.0.latest_error()
        }

        fn error_count(&self) -> u64 {
            self.0.error_count()
        }
    }
}
