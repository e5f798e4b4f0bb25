//! Interleaved Cs16 sample streams
//!
//! This module frames an interleaved signed 16-bit little-endian I/Q stream
//! (`I0 Q0 I1 Q1 ...`) into 128-sample block pairs, writes block pairs back in
//! the same layout, and provides [`StreamHost`], a [`BlockHost`] that runs a
//! preprocessor over any reader/writer pair.
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dsp::transform::Transform;
use crate::error::{Error, Result};
use crate::host::BlockHost;
use crate::preprocessor::{IqPreprocessor, TickOutcome};
use crate::{BLOCK_SIZE, BlockPair, Channel, SampleBlock};

/// Bytes per I/Q sample pair
const BYTES_PER_SAMPLE: usize = 4;

/// Bytes per 128-sample frame
pub const FRAME_BYTES: usize = BLOCK_SIZE * BYTES_PER_SAMPLE;

/**
 * Cs16 frame reader
 */
pub struct Cs16Reader<R: Read> {
    reader: R,
    frame: [u8; FRAME_BYTES],
}

impl Cs16Reader<std::io::BufReader<std::fs::File>> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expanduser(path.as_ref().to_path_buf());
        let file = std::fs::File::open(path)?;
        Ok(Self::new(std::io::BufReader::new(file)))
    }
}

impl<R: Read> Cs16Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frame: [0; FRAME_BYTES],
        }
    }

    /// Read the next block pair, `None` at a clean end of stream.
    ///
    /// A stream ending in the middle of a frame is a [`Error::Format`].
    pub fn read_pair(&mut self) -> Result<Option<BlockPair>> {
        let mut total_read = 0;
        while total_read < FRAME_BYTES {
            match self.reader.read(&mut self.frame[total_read..]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if total_read == 0 {
            return Ok(None);
        }
        if total_read < FRAME_BYTES {
            return Err(Error::format(format!(
                "stream ended inside a frame ({total_read} of {FRAME_BYTES} bytes)"
            )));
        }

        let mut pair = BlockPair::zeroed();
        for (k, c) in self.frame.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
            pair.i[k] = i16::from_le_bytes([c[0], c[1]]);
            pair.q[k] = i16::from_le_bytes([c[2], c[3]]);
        }
        Ok(Some(pair))
    }
}

impl<R: Read> Iterator for Cs16Reader<R> {
    type Item = Result<BlockPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_pair().transpose()
    }
}

/**
 * Cs16 frame writer
 */
pub struct Cs16Writer<W: Write> {
    writer: W,
    frame: [u8; FRAME_BYTES],
}

impl Cs16Writer<std::io::BufWriter<std::fs::File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expanduser(path.as_ref().to_path_buf());
        let file = std::fs::File::create(path)?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write> Cs16Writer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frame: [0; FRAME_BYTES],
        }
    }

    pub fn write_blocks(&mut self, i: &SampleBlock, q: &SampleBlock) -> Result<()> {
        for ((c, si), sq) in self
            .frame
            .chunks_exact_mut(BYTES_PER_SAMPLE)
            .zip(i.iter())
            .zip(q.iter())
        {
            c[..2].copy_from_slice(&si.to_le_bytes());
            c[2..].copy_from_slice(&sq.to_le_bytes());
        }
        self.writer.write_all(&self.frame)?;
        Ok(())
    }

    pub fn write_pair(&mut self, pair: &BlockPair) -> Result<()> {
        self.write_blocks(&pair.i, &pair.q)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Totals reported by [`StreamHost::run`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub frames_read: u64,
    pub frames_written: u64,
}

/**
 * Block host over a Cs16 reader and writer
 *
 * Acquiring the I block pulls the next frame from the reader and stages its Q
 * half; acquiring Q hands that staged half out. Emitted I blocks wait for
 * their Q partner and the pair is written as one frame. The first I/O or
 * format error stops the stream and is kept for [`finish`](Self::finish).
 */
pub struct StreamHost<R: Read, W: Write> {
    reader: Cs16Reader<R>,
    writer: Cs16Writer<W>,
    staged_q: Option<SampleBlock>,
    emitted_i: Option<SampleBlock>,
    error: Option<Error>,
    end_of_stream: bool,
    summary: StreamSummary,
}

impl<R: Read, W: Write> StreamHost<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::from_parts(Cs16Reader::new(reader), Cs16Writer::new(writer))
    }

    pub fn from_parts(reader: Cs16Reader<R>, writer: Cs16Writer<W>) -> Self {
        Self {
            reader,
            writer,
            staged_q: None,
            emitted_i: None,
            error: None,
            end_of_stream: false,
            summary: StreamSummary::default(),
        }
    }

    /// True once the input is exhausted or an error occurred
    pub fn is_done(&self) -> bool {
        self.end_of_stream || self.error.is_some()
    }

    pub fn summary(&self) -> StreamSummary {
        self.summary
    }

    /// Drive `preprocessor` until the input runs out.
    pub fn run<T: Transform>(
        &mut self,
        preprocessor: &mut IqPreprocessor<T>,
    ) -> Result<StreamSummary> {
        while !self.is_done() {
            if let TickOutcome::Processed(report) = preprocessor.update(self)
                && !report.transition.is_none()
            {
                debug!(
                    frame = self.summary.frames_read,
                    mode = %preprocessor.correction(),
                    "correction changed"
                );
            }
        }
        self.finish()
    }

    /// Flush the writer and surface any error recorded while streaming.
    pub fn finish(&mut self) -> Result<StreamSummary> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        info!(
            frames_read = self.summary.frames_read,
            frames_written = self.summary.frames_written,
            "stream finished"
        );
        Ok(self.summary)
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn record(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

impl<R: Read, W: Write> BlockHost for StreamHost<R, W> {
    type Block = Box<SampleBlock>;

    fn acquire(&mut self, channel: Channel) -> Option<Self::Block> {
        match channel {
            Channel::I => {
                if self.is_done() {
                    return None;
                }
                match self.reader.read_pair() {
                    Ok(Some(pair)) => {
                        self.summary.frames_read += 1;
                        self.staged_q = Some(pair.q);
                        Some(Box::new(pair.i))
                    }
                    Ok(None) => {
                        self.end_of_stream = true;
                        None
                    }
                    Err(err) => {
                        self.record(err);
                        None
                    }
                }
            }
            Channel::Q => self.staged_q.take().map(Box::new),
        }
    }

    fn release(&mut self, _block: Self::Block) {}

    fn emit(&mut self, channel: Channel, block: &Self::Block) {
        match channel {
            Channel::I => self.emitted_i = Some(**block),
            Channel::Q => {
                let Some(i) = self.emitted_i.take() else {
                    self.record(Error::format("Q block emitted without its I block"));
                    return;
                };
                match self.writer.write_blocks(&i, block) {
                    Ok(()) => self.summary.frames_written += 1,
                    Err(err) => self.record(err),
                }
            }
        }
    }
}

/// Open a sample source: stdin for `None` or `-`, a file otherwise.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(expanduser(path.to_path_buf()))?;
            Ok(Box::new(std::io::BufReader::new(file)))
        }
        _ => Ok(Box::new(std::io::stdin().lock())),
    }
}

/// Open a sample sink: stdout for `None` or `-`, a file otherwise.
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::create(expanduser(path.to_path_buf()))?;
            Ok(Box::new(std::io::BufWriter::new(file)))
        }
        _ => Ok(Box::new(std::io::BufWriter::new(std::io::stdout().lock()))),
    }
}

fn expanduser(path: PathBuf) -> PathBuf {
    // Check if the path starts with "~"
    if let Some(stripped) = path.to_str().and_then(|p| p.strip_prefix("~"))
        && let Some(home_dir) = dirs::home_dir()
    {
        return home_dir.join(stripped.trim_start_matches('/'));
    }
    path
}
