use displaydoc::Display;

/// The reasons an IconVG byte stream can fail to decode, or an encoder can
/// fail to produce one.
///
/// Decoding surfaces the first error and stops; no destination calls are
/// made past the error point.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// invalid magic identifier
    InvalidMagicIdentifier,
    /// invalid number of metadata chunks
    InvalidNumberOfMetadataChunks,
    /// invalid metadata chunk length
    InvalidMetadataChunkLength,
    /// inconsistent metadata chunk length
    InconsistentMetadataChunkLength,
    /// invalid metadata identifier
    InvalidMetadataIdentifier,
    /// unsupported metadata identifier
    UnsupportedMetadataIdentifier,
    /// invalid view box
    InvalidViewBox,
    /// invalid suggested palette
    InvalidSuggestedPalette,
    /// invalid number
    InvalidNumber,
    /// invalid color
    InvalidColor,
    /// unsupported styling opcode
    UnsupportedStylingOpcode,
    /// unsupported drawing opcode
    UnsupportedDrawingOpcode,
    /// a started path was not ended
    UnfinishedPath,
}

impl std::error::Error for Error {}
