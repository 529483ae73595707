//! Disc-image header reading.
//!
//! Every supported container stores a 6-byte game ID and a null-terminated
//! title at fixed offsets near the start of the file. The offsets depend only
//! on the container format, which is picked from the file name.

use crate::identity::GameIdentity;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::Utf8Error;

/// Number of bytes read from the start of an image.
pub const HEADER_READ_LEN: u64 = 5000;

/// Width of the game ID field.
pub const GAME_ID_LEN: usize = 6;

/// File name suffixes that mark a disc image.
pub const DISC_IMAGE_SUFFIXES: [&str; 2] = [".iso", ".wbfs"];

/// Byte offsets of the header fields for one container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOffsets {
    /// Start of the 6-byte game ID.
    pub id_offset: usize,
    /// Start of the null-terminated title.
    pub name_offset: usize,
}

const WBFS_OFFSETS: HeaderOffsets = HeaderOffsets {
    id_offset: 512,
    name_offset: 544,
};

const ISO_OFFSETS: HeaderOffsets = HeaderOffsets {
    id_offset: 0,
    name_offset: 32,
};

/// Container formats with a known header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Wii Backup File System container (`.wbfs`).
    Wbfs,
    /// Plain or NKit disc image (`.iso`, `.nkit.iso`, anything else).
    Iso,
}

impl ContainerFormat {
    /// Picks the format from the file name.
    ///
    /// Names ending in `.wbfs` are WBFS; everything else falls back to the
    /// ISO layout, so the mapping is total.
    ///
    /// # Examples
    ///
    /// ```
    /// use discfold::header::ContainerFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(ContainerFormat::from_path(Path::new("game.wbfs")), ContainerFormat::Wbfs);
    /// assert_eq!(ContainerFormat::from_path(Path::new("game.nkit.iso")), ContainerFormat::Iso);
    /// ```
    pub fn from_path(path: &Path) -> Self {
        if name_ends_with(path, ".wbfs") {
            Self::Wbfs
        } else {
            Self::Iso
        }
    }

    /// Returns the header field offsets for this format.
    pub fn offsets(self) -> HeaderOffsets {
        match self {
            Self::Wbfs => WBFS_OFFSETS,
            Self::Iso => ISO_OFFSETS,
        }
    }

    /// Short lowercase name used in console output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Wbfs => "wbfs",
            Self::Iso => "iso",
        }
    }
}

/// Returns true if the file name ends in one of [`DISC_IMAGE_SUFFIXES`].
///
/// The match is case-sensitive: `GAME.ISO` does not qualify.
pub fn is_disc_image_name(path: &Path) -> bool {
    DISC_IMAGE_SUFFIXES
        .iter()
        .any(|suffix| name_ends_with(path, suffix))
}

fn name_ends_with(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(suffix.as_bytes()))
}

/// Errors raised while reading or decoding an image header.
#[derive(Debug)]
pub enum HeaderError {
    /// The image could not be opened or read.
    Io(std::io::Error),
    /// The file ended before the game ID field.
    Truncated { needed: usize, available: usize },
    /// The game ID bytes are not printable text.
    InvalidGameId { bytes: [u8; GAME_ID_LEN] },
    /// The title bytes are not valid UTF-8.
    InvalidTitle { source: Utf8Error },
    /// No null terminator was found after the title offset.
    UnterminatedTitle { offset: usize, available: usize },
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read image header: {}", e),
            Self::Truncated { needed, available } => write!(
                f,
                "Header too short: need {} bytes, file has {}",
                needed, available
            ),
            Self::InvalidGameId { bytes } => {
                write!(f, "Game ID is not valid text: {:02x?}", bytes)
            }
            Self::InvalidTitle { source } => write!(f, "Game title is not valid text: {}", source),
            Self::UnterminatedTitle { offset, available } => write!(
                f,
                "Game title at offset {} has no terminator within the first {} bytes",
                offset, available
            ),
        }
    }
}

impl std::error::Error for HeaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidTitle { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HeaderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type for header operations.
pub type HeaderResult<T> = Result<T, HeaderError>;

/// The decoded header of one disc image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameHeader {
    pub format: ContainerFormat,
    pub identity: GameIdentity,
}

impl GameHeader {
    /// Reads the header of the image at `path`.
    ///
    /// At most [`HEADER_READ_LEN`] bytes are read. A shorter file is fine as
    /// long as it still holds both fields.
    pub fn read(path: &Path) -> HeaderResult<Self> {
        let format = ContainerFormat::from_path(path);

        let mut buf = Vec::with_capacity(HEADER_READ_LEN as usize);
        File::open(path)?
            .take(HEADER_READ_LEN)
            .read_to_end(&mut buf)?;

        Self::parse(&buf, format)
    }

    /// Decodes the header fields from the leading bytes of an image.
    pub fn parse(bytes: &[u8], format: ContainerFormat) -> HeaderResult<Self> {
        let offsets = format.offsets();

        let id_end = offsets.id_offset + GAME_ID_LEN;
        let id_bytes = bytes
            .get(offsets.id_offset..id_end)
            .ok_or(HeaderError::Truncated {
                needed: id_end,
                available: bytes.len(),
            })?;
        let game_id = decode_game_id(id_bytes)?;

        // The scan is bounded by the bytes actually read
        let unterminated = || HeaderError::UnterminatedTitle {
            offset: offsets.name_offset,
            available: bytes.len(),
        };
        let name_bytes = bytes.get(offsets.name_offset..).ok_or_else(unterminated)?;
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(unterminated)?;
        let title = std::str::from_utf8(&name_bytes[..name_len])
            .map_err(|source| HeaderError::InvalidTitle { source })?;

        Ok(Self {
            format,
            identity: GameIdentity::new(game_id, title.to_string()),
        })
    }
}

fn decode_game_id(bytes: &[u8]) -> HeaderResult<String> {
    let invalid = || {
        let mut raw = [0u8; GAME_ID_LEN];
        raw.copy_from_slice(bytes);
        HeaderError::InvalidGameId { bytes: raw }
    };

    if bytes.iter().any(|&b| b == 0 || !b.is_ascii()) {
        return Err(invalid());
    }
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| invalid())
}

/// Reads an image header and returns the folder name for that game.
///
/// # Examples
///
/// ```no_run
/// use discfold::header::read_identity;
/// use std::path::Path;
///
/// let name = read_identity(Path::new("/games/zelda.iso")).unwrap();
/// println!("{}", name); // e.g. "Zelda [GZLE01]"
/// ```
pub fn read_identity(path: &Path) -> HeaderResult<String> {
    GameHeader::read(path).map(|header| header.identity.folder_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn image(format: ContainerFormat, id: &[u8], title: &[u8], len: usize) -> Vec<u8> {
        let offsets = format.offsets();
        let mut bytes = vec![0u8; len];
        bytes[offsets.id_offset..offsets.id_offset + id.len()].copy_from_slice(id);
        bytes[offsets.name_offset..offsets.name_offset + title.len()].copy_from_slice(title);
        bytes
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ContainerFormat::from_path(Path::new("a/b/game.wbfs")),
            ContainerFormat::Wbfs
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("game.iso")),
            ContainerFormat::Iso
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("game.nkit.iso")),
            ContainerFormat::Iso
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("game.bin")),
            ContainerFormat::Iso
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("game.WBFS")),
            ContainerFormat::Iso
        );
    }

    #[test]
    fn test_offset_table() {
        assert_eq!(
            ContainerFormat::Wbfs.offsets(),
            HeaderOffsets {
                id_offset: 512,
                name_offset: 544
            }
        );
        assert_eq!(
            ContainerFormat::Iso.offsets(),
            HeaderOffsets {
                id_offset: 0,
                name_offset: 32
            }
        );
    }

    #[test]
    fn test_disc_image_names() {
        assert!(is_disc_image_name(Path::new("game.iso")));
        assert!(is_disc_image_name(Path::new("game.nkit.iso")));
        assert!(is_disc_image_name(Path::new("game.wbfs")));
        assert!(!is_disc_image_name(Path::new("game.ISO")));
        assert!(!is_disc_image_name(Path::new("game.iso.txt")));
        assert!(!is_disc_image_name(Path::new("notes.txt")));
    }

    #[test]
    fn test_parse_iso_header() {
        let bytes = image(ContainerFormat::Iso, b"GZLE01", b"Zelda", 64);
        let header = GameHeader::parse(&bytes, ContainerFormat::Iso).unwrap();
        assert_eq!(header.identity.id, "GZLE01");
        assert_eq!(header.identity.title, "Zelda");
    }

    #[test]
    fn test_parse_wbfs_header() {
        let bytes = image(ContainerFormat::Wbfs, b"RMCE01", b"Mario Kart Wii", 1024);
        let header = GameHeader::parse(&bytes, ContainerFormat::Wbfs).unwrap();
        assert_eq!(header.identity.id, "RMCE01");
        assert_eq!(header.identity.title, "Mario Kart Wii");
    }

    #[test]
    fn test_parse_wbfs_ignores_iso_offsets() {
        let mut bytes = image(ContainerFormat::Wbfs, b"RSBE01", b"Brawl", 1024);
        bytes[..6].copy_from_slice(b"WBFS\0\0");
        let header = GameHeader::parse(&bytes, ContainerFormat::Wbfs).unwrap();
        assert_eq!(header.identity.id, "RSBE01");
    }

    #[test]
    fn test_parse_empty_title() {
        let bytes = image(ContainerFormat::Iso, b"RABC01", b"", 64);
        let header = GameHeader::parse(&bytes, ContainerFormat::Iso).unwrap();
        assert_eq!(header.identity.title, "");
    }

    #[test]
    fn test_parse_truncated_id() {
        let result = GameHeader::parse(b"GZL", ContainerFormat::Iso);
        assert!(matches!(
            result,
            Err(HeaderError::Truncated {
                needed: 6,
                available: 3
            })
        ));
    }

    #[test]
    fn test_parse_id_with_null_byte() {
        let bytes = image(ContainerFormat::Iso, b"GZ\0E01", b"Zelda", 64);
        let result = GameHeader::parse(&bytes, ContainerFormat::Iso);
        assert!(matches!(result, Err(HeaderError::InvalidGameId { .. })));
    }

    #[test]
    fn test_parse_id_with_non_ascii_byte() {
        let bytes = image(ContainerFormat::Iso, b"GZ\xffE01", b"Zelda", 64);
        let result = GameHeader::parse(&bytes, ContainerFormat::Iso);
        assert!(matches!(result, Err(HeaderError::InvalidGameId { .. })));
    }

    #[test]
    fn test_parse_invalid_title() {
        let bytes = image(ContainerFormat::Iso, b"GZLE01", b"Zel\xff\xfe", 64);
        let result = GameHeader::parse(&bytes, ContainerFormat::Iso);
        assert!(matches!(result, Err(HeaderError::InvalidTitle { .. })));
    }

    #[test]
    fn test_parse_unterminated_title() {
        let mut bytes = vec![b'A'; 100];
        bytes[..6].copy_from_slice(b"GZLE01");
        let result = GameHeader::parse(&bytes, ContainerFormat::Iso);
        assert!(matches!(
            result,
            Err(HeaderError::UnterminatedTitle {
                offset: 32,
                available: 100
            })
        ));
    }

    #[test]
    fn test_parse_title_offset_past_end() {
        let result = GameHeader::parse(b"GZLE01", ContainerFormat::Iso);
        assert!(matches!(
            result,
            Err(HeaderError::UnterminatedTitle { .. })
        ));
    }

    #[test]
    fn test_read_only_scans_first_5000_bytes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("long.iso");

        // Terminator sits just past the read window
        let mut bytes = vec![b'A'; HEADER_READ_LEN as usize + 10];
        bytes[..6].copy_from_slice(b"GZLE01");
        bytes[HEADER_READ_LEN as usize + 1] = 0;
        fs::write(&path, bytes).expect("Failed to write image");

        let result = GameHeader::read(&path);
        assert!(matches!(
            result,
            Err(HeaderError::UnterminatedTitle {
                available: 5000,
                ..
            })
        ));
    }

    #[test]
    fn test_read_short_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("short.iso");
        fs::write(&path, image(ContainerFormat::Iso, b"GALE01", b"Melee", 40))
            .expect("Failed to write image");

        assert_eq!(read_identity(&path).unwrap(), "Melee [GALE01]");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_identity(Path::new("/non/existent/game.iso"));
        assert!(matches!(result, Err(HeaderError::Io(_))));
    }
}
