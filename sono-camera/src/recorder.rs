//! Buffer de quadros e gravação de vídeo
//!
//! O contêiner é um AVI (RIFF) sem compressão: cada quadro vira um chunk
//! `00db` com linhas BGR de baixo para cima, alinhadas a 4 bytes, seguido de
//! um índice `idx1`. Qualquer reprodutor que entenda `DIB `/BI_RGB lê o
//! arquivo sem codecs externos.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CameraError, CameraResult};
use crate::types::Frame;

/// Tag de codec padrão (RGB sem compressão)
pub const DEFAULT_FOURCC: [u8; 4] = *b"DIB ";

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const AVIH_SIZE: u32 = 56;
const STRH_SIZE: u32 = 56;
const STRF_SIZE: u32 = 40;
const INDEX_ENTRY_SIZE: u32 = 16;

/// Quadros acumulados entre `start` e `drain`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecorder {
    frames: Vec<Frame>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descarta o que houver no buffer
    pub fn start(&mut self) {
        self.frames.clear();
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Esvazia o buffer devolvendo os quadros
    pub fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }
}

/// Resultado de uma gravação
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub path: PathBuf,
    pub frames: usize,
    pub fps: u32,
    pub height: usize,
    pub width: usize,
    pub bytes: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESCRITA AVI
// ═══════════════════════════════════════════════════════════════════════════════

/// Bytes por linha BGR, alinhados a 4
fn row_stride(width: usize) -> usize {
    (width * 3).div_ceil(4) * 4
}

fn to_u32(value: usize, what: &str) -> CameraResult<u32> {
    u32::try_from(value)
        .map_err(|_| CameraError::InvalidConfig(format!("{} too large for AVI: {}", what, value)))
}

/// Escritor de AVI não comprimido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AviWriter {
    height: usize,
    width: usize,
    fps: u32,
    fourcc: [u8; 4],
}

impl AviWriter {
    pub fn new(height: usize, width: usize, fps: u32) -> CameraResult<Self> {
        if fps == 0 {
            return Err(CameraError::InvalidFrameRate(fps));
        }
        if height == 0 || width == 0 {
            return Err(CameraError::InvalidConfig(
                "Video height and width must be > 0".into(),
            ));
        }
        Ok(Self {
            height,
            width,
            fps,
            fourcc: DEFAULT_FOURCC,
        })
    }

    pub fn with_fourcc(mut self, fourcc: [u8; 4]) -> Self {
        self.fourcc = fourcc;
        self
    }

    fn frame_bytes(&self) -> usize {
        row_stride(self.width) * self.height
    }

    /// Confere dimensões antes de escrever qualquer byte
    fn check_frames(&self, frames: &[Frame]) -> CameraResult<()> {
        let expected = (self.height, self.width);
        match frames
            .iter()
            .find(|f| f.shape() != expected || f.pixels.len() != self.height * self.width)
        {
            Some(bad) => Err(CameraError::FrameShape {
                expected,
                found: bad.shape(),
            }),
            None => Ok(()),
        }
    }

    /// Valida quadros e tamanhos antes de escrever qualquer byte
    fn layout(&self, frames: &[Frame]) -> CameraResult<AviLayout> {
        self.check_frames(frames)?;
        AviLayout::compute(
            to_u32(frames.len(), "Frame count")?,
            to_u32(self.frame_bytes(), "Frame size")?,
        )
    }

    /// Serializa os quadros em `out`; retorna o total de bytes escritos
    pub fn write_to<W: Write>(&self, out: &mut W, frames: &[Frame]) -> CameraResult<u64> {
        let n = to_u32(frames.len(), "Frame count")?;
        let frame_bytes = to_u32(self.frame_bytes(), "Frame size")?;
        let width = to_u32(self.width, "Width")?;
        let height = to_u32(self.height, "Height")?;

        let AviLayout {
            strl_size,
            hdrl_size,
            movi_size,
            idx_size,
            riff_size,
            chunk_stride,
        } = self.layout(frames)?;

        let mut w = ChunkWriter { out, written: 0 };

        w.tag(b"RIFF")?;
        w.u32(riff_size)?;
        w.tag(b"AVI ")?;

        w.tag(b"LIST")?;
        w.u32(hdrl_size)?;
        w.tag(b"hdrl")?;

        // avih
        w.tag(b"avih")?;
        w.u32(AVIH_SIZE)?;
        w.u32(1_000_000 / self.fps)?;
        w.u32(frame_bytes.saturating_mul(self.fps))?;
        w.u32(0)?;
        w.u32(AVIF_HASINDEX)?;
        w.u32(n)?;
        w.u32(0)?;
        w.u32(1)?;
        w.u32(frame_bytes)?;
        w.u32(width)?;
        w.u32(height)?;
        for _ in 0..4 {
            w.u32(0)?;
        }

        w.tag(b"LIST")?;
        w.u32(strl_size)?;
        w.tag(b"strl")?;

        // strh
        w.tag(b"strh")?;
        w.u32(STRH_SIZE)?;
        w.tag(b"vids")?;
        w.tag(&self.fourcc)?;
        w.u32(0)?;
        w.u16(0)?;
        w.u16(0)?;
        w.u32(0)?;
        w.u32(1)?;
        w.u32(self.fps)?;
        w.u32(0)?;
        w.u32(n)?;
        w.u32(frame_bytes)?;
        w.u32(u32::MAX)?;
        w.u32(0)?;
        w.u16(0)?;
        w.u16(0)?;
        w.u16(width as u16)?;
        w.u16(height as u16)?;

        // strf (BITMAPINFOHEADER, BI_RGB 24 bits, linhas de baixo para cima)
        w.tag(b"strf")?;
        w.u32(STRF_SIZE)?;
        w.u32(STRF_SIZE)?;
        w.u32(width)?;
        w.u32(height)?;
        w.u16(1)?;
        w.u16(24)?;
        w.u32(0)?;
        w.u32(frame_bytes)?;
        for _ in 0..4 {
            w.u32(0)?;
        }

        w.tag(b"LIST")?;
        w.u32(movi_size)?;
        w.tag(b"movi")?;

        let stride = row_stride(self.width);
        let mut row = vec![0u8; stride];
        for frame in frames {
            w.tag(b"00db")?;
            w.u32(frame_bytes)?;
            for r in (0..self.height).rev() {
                let pixels = &frame.pixels[r * self.width..(r + 1) * self.width];
                for (dst, p) in row.chunks_exact_mut(3).zip(pixels) {
                    dst.copy_from_slice(&[p.b, p.g, p.r]);
                }
                w.bytes(&row)?;
            }
        }

        w.tag(b"idx1")?;
        w.u32(idx_size)?;
        for i in 0..n {
            w.tag(b"00db")?;
            w.u32(AVIIF_KEYFRAME)?;
            // Deslocamento relativo ao tag 'movi'
            w.u32(4 + i * chunk_stride)?;
            w.u32(frame_bytes)?;
        }

        w.out.flush()?;
        Ok(w.written)
    }

    /// Grava os quadros em `path`
    pub fn write_file(&self, path: &Path, frames: &[Frame]) -> CameraResult<RecordingSummary> {
        self.layout(frames)?;
        let mut out = BufWriter::new(File::create(path)?);
        let bytes = self.write_to(&mut out, frames)?;
        Ok(RecordingSummary {
            path: path.to_path_buf(),
            frames: frames.len(),
            fps: self.fps,
            height: self.height,
            width: self.width,
            bytes,
        })
    }
}

/// Tamanhos de chunk RIFF para `n` quadros de `frame_bytes` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AviLayout {
    strl_size: u32,
    hdrl_size: u32,
    movi_size: u32,
    idx_size: u32,
    riff_size: u32,
    /// Cabeçalho `00db` + dados de um quadro
    chunk_stride: u32,
}

impl AviLayout {
    /// Falha com [`CameraError::Container`] se o arquivo não cabe em 4 GiB
    fn compute(n: u32, frame_bytes: u32) -> CameraResult<Self> {
        let too_large = || {
            CameraError::Container(format!(
                "{} frames of {} bytes exceed the 4 GiB RIFF limit",
                n, frame_bytes
            ))
        };

        let strl_size = 4 + (8 + STRH_SIZE) + (8 + STRF_SIZE);
        let hdrl_size = 4 + (8 + AVIH_SIZE) + (8 + strl_size);
        let chunk_stride = frame_bytes.checked_add(8).ok_or_else(too_large)?;
        let movi_size = n
            .checked_mul(chunk_stride)
            .and_then(|v| v.checked_add(4))
            .ok_or_else(too_large)?;
        let idx_size = n.checked_mul(INDEX_ENTRY_SIZE).ok_or_else(too_large)?;
        let riff_size = [8 + hdrl_size, 8, movi_size, 8, idx_size]
            .into_iter()
            .try_fold(4u32, u32::checked_add)
            .ok_or_else(too_large)?;

        Ok(Self {
            strl_size,
            hdrl_size,
            movi_size,
            idx_size,
            riff_size,
            chunk_stride,
        })
    }
}

struct ChunkWriter<'a, W: Write> {
    out: &'a mut W,
    written: u64,
}

impl<W: Write> ChunkWriter<'_, W> {
    fn bytes(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    fn tag(&mut self, tag: &[u8; 4]) -> std::io::Result<()> {
        self.bytes(tag)
    }

    fn u32(&mut self, v: u32) -> std::io::Result<()> {
        self.bytes(&v.to_le_bytes())
    }

    fn u16(&mut self, v: u16) -> std::io::Result<()> {
        self.bytes(&v.to_le_bytes())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEITURA DE CABEÇALHO
// ═══════════════════════════════════════════════════════════════════════════════

/// Campos principais de um AVI escrito por [`AviWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AviInfo {
    pub fourcc: [u8; 4],
    pub width: u32,
    pub height: u32,
    pub total_frames: u32,
    pub rate: u32,
    pub scale: u32,
    pub micros_per_frame: u32,
    /// Chunks `00db` efetivamente presentes em `movi`
    pub frame_chunks: usize,
}

impl AviInfo {
    pub fn fps(&self) -> f64 {
        if self.scale == 0 {
            0.0
        } else {
            self.rate as f64 / self.scale as f64
        }
    }

    pub fn from_file(path: &Path) -> CameraResult<Self> {
        Self::parse(&std::fs::read(path)?)
    }

    /// Lê o layout fixo produzido por [`AviWriter`]
    pub fn parse(data: &[u8]) -> CameraResult<Self> {
        let le32 = |at: usize| -> CameraResult<u32> {
            data.get(at..at + 4)
                .and_then(|b| b.try_into().ok())
                .map(u32::from_le_bytes)
                .ok_or_else(|| CameraError::Container(format!("Truncated at byte {}", at)))
        };
        let tag = |at: usize| -> CameraResult<[u8; 4]> {
            data.get(at..at + 4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| CameraError::Container(format!("Truncated at byte {}", at)))
        };
        let expect = |at: usize, want: &[u8; 4]| -> CameraResult<()> {
            if &tag(at)? == want {
                Ok(())
            } else {
                Err(CameraError::Container(format!(
                    "Expected '{}' at byte {}",
                    String::from_utf8_lossy(want),
                    at
                )))
            }
        };

        expect(0, b"RIFF")?;
        expect(8, b"AVI ")?;
        expect(12, b"LIST")?;
        let hdrl_size = le32(16)? as usize;
        expect(20, b"hdrl")?;
        expect(24, b"avih")?;
        let avih = 32;
        let micros_per_frame = le32(avih)?;
        let total_frames = le32(avih + 16)?;
        let width = le32(avih + 32)?;
        let height = le32(avih + 36)?;

        let strh = avih + AVIH_SIZE as usize + 12 + 8;
        expect(strh - 8, b"strh")?;
        expect(strh, b"vids")?;
        let fourcc = tag(strh + 4)?;
        let scale = le32(strh + 20)?;
        let rate = le32(strh + 24)?;

        let movi_list = 20 + hdrl_size;
        expect(movi_list, b"LIST")?;
        let movi_size = le32(movi_list + 4)? as usize;
        expect(movi_list + 8, b"movi")?;

        let end = movi_list + 8 + movi_size;
        let mut at = movi_list + 12;
        let mut frame_chunks = 0;
        while at + 8 <= end {
            let id = tag(at)?;
            let size = le32(at + 4)? as usize;
            if &id == b"00db" {
                frame_chunks += 1;
            }
            at += 8 + size + (size & 1);
        }

        Ok(Self {
            fourcc,
            width,
            height,
            total_frames,
            rate,
            scale,
            micros_per_frame,
            frame_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pixel;

    #[test]
    fn test_recorder_lifecycle() {
        let mut recorder = FrameRecorder::new();
        recorder.push(Frame::black(2, 2));
        recorder.push(Frame::black(3, 3));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.frames()[1].shape(), (3, 3));

        recorder.start();
        assert!(recorder.is_empty());
        recorder.push(Frame::black(1, 1));
        assert_eq!(recorder.drain().len(), 1);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_row_stride_alignment() {
        assert_eq!(row_stride(4), 12);
        assert_eq!(row_stride(5), 16);
        assert_eq!(row_stride(1), 4);
    }

    #[test]
    fn test_zero_frame_container() {
        let writer = AviWriter::new(6, 5, 30).unwrap();
        let mut buf = Vec::new();
        let bytes = writer.write_to(&mut buf, &[]).unwrap();
        assert_eq!(bytes as usize, buf.len());
        // RIFF(12) + hdrl(8 + 192) + movi(12) + idx1(8)
        assert_eq!(buf.len(), 232);

        let info = AviInfo::parse(&buf).unwrap();
        assert_eq!(info.total_frames, 0);
        assert_eq!(info.frame_chunks, 0);
        assert_eq!((info.width, info.height), (5, 6));
        assert_eq!(&info.fourcc, b"DIB ");
    }

    #[test]
    fn test_frames_and_rate_in_header() {
        let writer = AviWriter::new(2, 3, 25).unwrap();
        let frames = vec![Frame::black(2, 3); 4];
        let mut buf = Vec::new();
        writer.write_to(&mut buf, &frames).unwrap();

        let riff_size = u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize;
        assert_eq!(riff_size + 8, buf.len());

        let info = AviInfo::parse(&buf).unwrap();
        assert_eq!(info.total_frames, 4);
        assert_eq!(info.frame_chunks, 4);
        assert_eq!(info.fps(), 25.0);
        assert_eq!(info.micros_per_frame, 40_000);
    }

    #[test]
    fn test_pixels_are_bgr_bottom_up() {
        let writer = AviWriter::new(2, 1, 1).unwrap();
        let mut frame = Frame::black(2, 1);
        frame.pixels[0] = Pixel::new(1, 2, 3);
        frame.pixels[1] = Pixel::new(4, 5, 6);
        let mut buf = Vec::new();
        writer.write_to(&mut buf, &[frame]).unwrap();

        // Primeiro chunk de dados logo após 'movi'
        let data = 224 + 8;
        assert_eq!(&buf[data..data + 4], &[6, 5, 4, 0]);
        assert_eq!(&buf[data + 4..data + 8], &[3, 2, 1, 0]);
    }

    #[test]
    fn test_layout_matches_written_sizes() {
        let layout = AviLayout::compute(0, 20).unwrap();
        assert_eq!(layout.hdrl_size, 192);
        assert_eq!(layout.movi_size, 4);
        assert_eq!(layout.riff_size as usize + 8, 232);

        let layout = AviLayout::compute(1000, 921_600).unwrap();
        assert_eq!(layout.chunk_stride, 921_608);
        assert_eq!(layout.movi_size, 4 + 1000 * 921_608);
        assert_eq!(layout.idx_size, 16_000);
    }

    #[test]
    fn test_layout_beyond_riff_limit_is_rejected() {
        // 4661 quadros 640×480 passam de u32::MAX bytes em 'movi'
        assert!(matches!(
            AviLayout::compute(4661, 921_600),
            Err(CameraError::Container(_))
        ));
        // Último tamanho que ainda cabe
        assert!(AviLayout::compute(4660, 921_600).is_ok());
        assert!(AviLayout::compute(u32::MAX, 0).is_err());
        assert!(AviLayout::compute(1, u32::MAX).is_err());
    }

    #[test]
    fn test_invalid_writer_inputs() {
        assert!(matches!(AviWriter::new(2, 2, 0), Err(CameraError::InvalidFrameRate(0))));
        let writer = AviWriter::new(2, 2, 30).unwrap();
        let err = writer.write_to(&mut Vec::new(), &[Frame::black(2, 3)]).unwrap_err();
        assert!(matches!(err, CameraError::FrameShape { expected: (2, 2), found: (2, 3) }));
    }
}
