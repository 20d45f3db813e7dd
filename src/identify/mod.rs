//! Game image identification.
//!
//! [`identify`] classifies whatever an [`AccessLayer`] points at. It never
//! panics and never reads more than it asks for. Checks run in a fixed
//! priority order:
//!
//! ```text
//! extension  .iso   ──► Mode 2 sync check, else PSP disc
//!            .cso   ──► PSP disc
//!            .ppst  ──► save state
//!            .ppdmp ──► trace dump if the magic matches
//! directory         ──► EBOOT.PBP > PSP_GAME > PARAM.SFO > plain
//! magic      PK/Rar!/\0PBP/\x7FELF
//! extension  fallbacks (.pbp .bin .zip .rar .r00 .r01 .7z)
//! ```
//!
//! Short reads are low-confidence signals: they fall through to the next
//! branch instead of failing.

mod kind;
mod magic;
mod pbp;
mod sfo;

#[cfg(feature = "batch")]
mod batch;

pub use kind::GameImageKind;
pub use magic::{GAME_DIR_MARKER, MODE2_SYNC, Magic, RAW_SECTOR_SIZE};
pub use pbp::{PbpHeader, PbpSubFile};
pub use sfo::{ParamSfo, SfoValue};

#[cfg(feature = "batch")]
pub use batch::{identify_all, identify_all_each};

#[cfg(test)]
pub(crate) use pbp::testing::build_pbp;
#[cfg(test)]
pub(crate) use sfo::testing::build_sfo;

use crate::access::{AccessLayer, read_array, read_u32_le};
use crate::diagnostic::IdentifyError;
use crate::locator::{EBOOT_FILENAME, Locator};
use magic::{NP_PSAR_TAG, PS1_CATEGORY, PS1_PSAR_TAG, PSAR_OFFSET_FIELD, TRACE_DUMP_MAGIC};

/// Directory paths this short cannot hold a game.
const MIN_DIRECTORY_PATH: usize = 5;

/// Extensions that make an executable launchable.
const LAUNCHABLE_EXTENSIONS: [&str; 4] = [".plf", ".elf", ".prx", ".pbp"];

/// Classify the target of `layer`.
pub fn identify(layer: &dyn AccessLayer) -> Result<GameImageKind, IdentifyError> {
    let locator = layer.locator();
    if locator.is_empty() {
        return Err(IdentifyError::InvalidPath {
            path: locator.to_string(),
        });
    }
    if !layer.exists() {
        return Err(IdentifyError::NotFound {
            path: locator.to_string(),
        });
    }

    let extension = locator.extension();
    match extension.as_str() {
        ".iso" => return Ok(identify_iso(layer)),
        ".cso" => return Ok(GameImageKind::DiscImage),
        ".ppst" => return Ok(GameImageKind::SaveState),
        ".ppdmp" if read_array::<8>(layer, 0) == Some(TRACE_DUMP_MAGIC) => {
            return Ok(GameImageKind::TraceDump);
        }
        _ => {}
    }

    if layer.is_directory() {
        return Ok(identify_directory(layer));
    }

    // A file shorter than the magic falls through; anything else short is I/O trouble.
    let head = layer.read_at(0, 4);
    if (head.len() as u64) < layer.size().min(4) {
        return Err(IdentifyError::Read);
    }

    let kind = match Magic::classify(&head) {
        Magic::Zip => GameImageKind::ZipArchive,
        Magic::Rar => GameImageKind::RarArchive,
        Magic::Elf => identify_executable(locator, &extension),
        Magic::Pbp => identify_container(layer),
        Magic::None => by_extension(locator, &extension),
    };
    Ok(kind)
}

fn identify_iso(layer: &dyn AccessLayer) -> GameImageKind {
    let size = layer.size();
    if size > 0
        && size % RAW_SECTOR_SIZE == 0
        && read_array::<12>(layer, 0) == Some(MODE2_SYNC)
    {
        log::info!("ISO in Mode 2: Not a PSP game");
        return GameImageKind::Mode2Disc;
    }
    GameImageKind::DiscImage
}

fn identify_directory(layer: &dyn AccessLayer) -> GameImageKind {
    if layer.locator().len() < MIN_DIRECTORY_PATH {
        return GameImageKind::PlainDirectory;
    }
    if layer.has_child(EBOOT_FILENAME) {
        GameImageKind::ContainerInDirectory
    } else if layer.has_child("PSP_GAME") {
        GameImageKind::DiscDirectory
    } else if layer.has_child("PARAM.SFO") {
        GameImageKind::SaveDataDirectory
    } else {
        GameImageKind::PlainDirectory
    }
}

fn identify_executable(locator: &Locator, extension: &str) -> GameImageKind {
    if LAUNCHABLE_EXTENSIONS.contains(&extension) || locator.filename().contains("BOOT.BIN") {
        GameImageKind::Executable
    } else {
        GameImageKind::UnrecognizedExecutable
    }
}

fn identify_container(layer: &dyn AccessLayer) -> GameImageKind {
    if is_ps1_category(layer) {
        return GameImageKind::Ps1Container;
    }

    let psar_offset = read_u32_le(layer, PSAR_OFFSET_FIELD);
    let psar_tag = read_array::<4>(layer, u64::from(psar_offset)).unwrap_or_default();
    if psar_tag == NP_PSAR_TAG {
        GameImageKind::NpDiscImage
    } else if psar_tag == PS1_PSAR_TAG {
        GameImageKind::Ps1Container
    } else if layer.locator().contains(GAME_DIR_MARKER) {
        GameImageKind::ContainerInDirectory
    } else {
        GameImageKind::Container
    }
}

fn is_ps1_category(layer: &dyn AccessLayer) -> bool {
    if let Some(header) = PbpHeader::read(layer)
        && let Some(blob) = header.sub_file(layer, PbpSubFile::ParamSfo)
        && let Some(sfo) = ParamSfo::parse(&blob)
    {
        return sfo.get_text("CATEGORY").as_deref() == Some(PS1_CATEGORY);
    }
    false
}

fn by_extension(locator: &Locator, extension: &str) -> GameImageKind {
    match extension {
        ".pbp" => {
            log::warn!("{locator} has a .pbp extension but no PBP magic, treating it as one anyway");
            GameImageKind::Container
        }
        ".bin" => GameImageKind::UnknownBinary,
        ".zip" => GameImageKind::ZipArchive,
        ".rar" | ".r00" | ".r01" => GameImageKind::RarArchive,
        ".7z" => GameImageKind::SevenZipArchive,
        _ => GameImageKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::access::LocalAccess;
    use crate::access::testing::FakeAccess;
    use tempfile::TempDir;

    fn fake(path: &str, data: impl Into<Vec<u8>>) -> FakeAccess {
        FakeAccess::new(path, data)
    }

    fn sfo_with_category(category: &str) -> Vec<u8> {
        build_sfo(&[("CATEGORY", SfoValue::Text(category.into()))])
    }

    #[test]
    fn test_empty_path_and_missing() {
        let err = identify(&fake("", Vec::new())).unwrap_err();
        assert!(matches!(err, IdentifyError::InvalidPath { .. }));
        assert!(!err.to_string().is_empty());

        let mut missing = fake("/games/none.iso", Vec::new());
        missing.missing = true;
        let err = identify(&missing).unwrap_err();
        assert_eq!(err, IdentifyError::NotFound { path: "/games/none.iso".into() });
    }

    #[test]
    fn test_iso_mode2_vs_candidate() {
        let mut raw = MODE2_SYNC.to_vec();
        raw.resize(RAW_SECTOR_SIZE as usize * 2, 0);
        assert_eq!(identify(&fake("/a.iso", raw.clone())), Ok(GameImageKind::Mode2Disc));

        // Size is a multiple of the raw sector size but the sync pattern is absent.
        raw[0] = 0x01;
        assert_eq!(identify(&fake("/a.iso", raw)), Ok(GameImageKind::DiscImage));

        // Sync pattern present but size rules out raw sectors.
        let mut cooked = MODE2_SYNC.to_vec();
        cooked.resize(2048, 0);
        assert_eq!(identify(&fake("/a.ISO", cooked)), Ok(GameImageKind::DiscImage));
    }

    #[test]
    fn test_direct_extensions() {
        assert_eq!(identify(&fake("/a.cso", b"CISO")), Ok(GameImageKind::DiscImage));
        assert_eq!(identify(&fake("/a.ppst", b"")), Ok(GameImageKind::SaveState));
        assert_eq!(
            identify(&fake("/a.ppdmp", b"PPSSPPGE-rest".to_vec())),
            Ok(GameImageKind::TraceDump)
        );
        // A wrong trace magic falls through rather than failing.
        assert_eq!(identify(&fake("/a.ppdmp", b"PPSSPPXX".to_vec())), Ok(GameImageKind::Unknown));
    }

    #[test]
    fn test_directory_priority() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("GAME");
        fs::create_dir(&dir).unwrap();
        let open = || LocalAccess::new(Locator::local(dir.to_string_lossy()));

        assert_eq!(identify(&open()), Ok(GameImageKind::PlainDirectory));

        fs::write(dir.join("PARAM.SFO"), b"").unwrap();
        assert_eq!(identify(&open()), Ok(GameImageKind::SaveDataDirectory));

        fs::create_dir(dir.join("PSP_GAME")).unwrap();
        assert_eq!(identify(&open()), Ok(GameImageKind::DiscDirectory));

        fs::write(dir.join("EBOOT.PBP"), b"").unwrap();
        assert_eq!(identify(&open()), Ok(GameImageKind::ContainerInDirectory));
    }

    #[test]
    fn test_short_directory_path_is_plain() {
        let mut layer = fake("/ab", Vec::new());
        layer.directory = true;
        assert_eq!(identify(&layer), Ok(GameImageKind::PlainDirectory));
    }

    #[test]
    fn test_archive_magics() {
        assert_eq!(identify(&fake("/a.dat", b"PK\x03\x04..")), Ok(GameImageKind::ZipArchive));
        assert_eq!(identify(&fake("/a.dat", b"PK\x05\x06")), Ok(GameImageKind::ZipArchive));
        assert_eq!(identify(&fake("/a.dat", b"PK\x07\x08")), Ok(GameImageKind::ZipArchive));
    }

    #[test]
    fn test_rar_reads_only_the_magic() {
        let layer = fake("/game.rar", b"Rar!\x1a\x07\x00".repeat(100));
        assert_eq!(identify(&layer), Ok(GameImageKind::RarArchive));
        assert_eq!(layer.reads(), 1);
    }

    #[test]
    fn test_executables() {
        assert_eq!(identify(&fake("/a.elf", b"\x7FELF")), Ok(GameImageKind::Executable));
        assert_eq!(identify(&fake("/a.prx", b"\x7FELF")), Ok(GameImageKind::Executable));
        assert_eq!(
            identify(&fake("/PSP_GAME/SYSDIR/BOOT.BIN", b"\x7FELF")),
            Ok(GameImageKind::Executable)
        );
        assert_eq!(
            identify(&fake("/a.so", b"\x7FELF")),
            Ok(GameImageKind::UnrecognizedExecutable)
        );
    }

    #[test]
    fn test_container_sub_archive_tags() {
        let np = build_pbp(&sfo_with_category("UG"), b"NPUMDIMG");
        assert_eq!(identify(&fake("/a.pbp", np)), Ok(GameImageKind::NpDiscImage));

        let ps1 = build_pbp(&sfo_with_category("UG"), b"PSISOIMG0000");
        assert_eq!(identify(&fake("/a.pbp", ps1)), Ok(GameImageKind::Ps1Container));

        let loose = build_pbp(&sfo_with_category("UG"), b"");
        assert_eq!(identify(&fake("/a.pbp", loose.clone())), Ok(GameImageKind::Container));
        assert_eq!(
            identify(&fake("ms0/PSP/GAME/DEMO/EBOOT.PBP", loose)),
            Ok(GameImageKind::ContainerInDirectory)
        );
    }

    #[test]
    fn test_ps1_category_overrides_np_tag() {
        let data = build_pbp(&sfo_with_category("ME"), b"NPUMDIMG");
        assert_eq!(identify(&fake("/a.pbp", data)), Ok(GameImageKind::Ps1Container));
    }

    #[test]
    fn test_truncated_container_degrades() {
        // Magic only: every best-effort read past it comes back short.
        assert_eq!(identify(&fake("/a.pbp", b"\0PBP")), Ok(GameImageKind::Container));
    }

    #[test]
    fn test_extension_fallbacks() {
        assert_eq!(identify(&fake("/a.pbp", b"junkjunk")), Ok(GameImageKind::Container));
        assert_eq!(identify(&fake("/a.bin", b"junk")), Ok(GameImageKind::UnknownBinary));
        assert_eq!(identify(&fake("/a.zip", b"")), Ok(GameImageKind::ZipArchive));
        assert_eq!(identify(&fake("/a.r00", b"")), Ok(GameImageKind::RarArchive));
        assert_eq!(identify(&fake("/a.7z", b"7z")), Ok(GameImageKind::SevenZipArchive));
        assert_eq!(identify(&fake("/a.txt", b"hello")), Ok(GameImageKind::Unknown));
    }

    #[test]
    fn test_failed_magic_read_is_error() {
        let layer = fake("/a.bin", b"data".to_vec()).failing(1);
        assert_eq!(identify(&layer), Err(IdentifyError::Read));
    }

    #[test]
    fn test_tiny_file_ignores_older_failure() {
        let layer = fake("/a.zip", b"PK".to_vec()).failing(1);
        assert!(layer.read_at(0, 2).is_empty());
        assert!(layer.latest_error().is_some());
        assert_eq!(identify(&layer), Ok(GameImageKind::ZipArchive));
    }

    #[test]
    fn test_directory_children_come_from_the_layer() {
        assert_eq!(
            identify(&FakeAccess::dir("content://games/DEMO", &["EBOOT.PBP", "PSP_GAME"])),
            Ok(GameImageKind::ContainerInDirectory)
        );
        assert_eq!(
            identify(&FakeAccess::dir("content://games/DISC", &["PSP_GAME"])),
            Ok(GameImageKind::DiscDirectory)
        );
        assert_eq!(
            identify(&FakeAccess::dir("content://saves/SLOT", &["PARAM.SFO"])),
            Ok(GameImageKind::SaveDataDirectory)
        );
    }

    #[test]
    fn test_directory_behind_registered_prefix() {
        use crate::chain::ChainBuilder;
        use crate::config::ConfigBuilder;
        use crate::registry::FactoryRegistry;

        let config = ConfigBuilder::new().headless(true).build().unwrap();
        let mut registry = FactoryRegistry::new();
        registry.register("content://", |loc: &Locator| -> crate::access::BoxedAccess {
            Box::new(FakeAccess::dir(loc.as_str(), &["PSP_GAME"]))
        });
        let chain = ChainBuilder::new(&registry, &config, None);
        let layer = chain.construct(&Locator::custom("content://", "content://tree/DISC1"));
        assert_eq!(identify(layer.as_ref()), Ok(GameImageKind::DiscDirectory));
    }
}
