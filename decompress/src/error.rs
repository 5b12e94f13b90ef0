use core::fmt;

/// Decompress Error Definitions.
///
/// Every error is fatal to the current decompression: there is no
/// partial recovery, and the caller should treat any bytes already
/// flushed through the output sink as invalid (see spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    /// A refill request found end-of-input before enough bits were
    /// available.
    InputTruncated,
    /// Invalid prefix-code lengths: a Kraft-sum mismatch, a code
    /// length greater than 15, or an empty (all-zero) length vector.
    InvalidCodeLengths,
    /// A header field was out of its legal range (e.g. `num_codes >
    /// 19`, `max_symbol > A`, a context-map fill count overshooting
    /// its map).
    MalformedHeader,
    /// An illegal distance code, or a distance/copy-length combination
    /// that would read or write outside of the legal window.
    InvalidDistance,
    /// A copy would write past the end of the current meta-block.
    MetaBlockOverrun,
    /// The caller-supplied decoded-size hint didn't match the actual
    /// output length (buffer-oriented entry point only).
    SizeMismatch,
    /// The output sink reported a write failure.
    SinkFailure,
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DecompressError::InputTruncated => "input ended before enough bits were available",
            DecompressError::InvalidCodeLengths => "prefix code lengths do not form a valid canonical code",
            DecompressError::MalformedHeader => "meta-block header field out of range",
            DecompressError::InvalidDistance => "distance code resolves outside the legal backward window",
            DecompressError::MetaBlockOverrun => "copy would write past the end of the meta-block",
            DecompressError::SizeMismatch => "decoded size did not match the caller-supplied buffer",
            DecompressError::SinkFailure => "output sink failed to accept a write",
        };
        f.write_str(msg)
    }
}
