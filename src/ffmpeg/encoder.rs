use crate::constants::{HW_PRESET_AMF, HW_PRESET_NVENC, HW_PRESET_QSV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    X264,
    H264Nvenc,
    H264Qsv,
    H264Amf,
    HevcNvenc,
    HevcQsv,
    HevcAmf,
}

impl VideoEncoder {
    pub fn as_ffmpeg_codec(&self) -> &'static str {
        match self {
            VideoEncoder::X264 => "libx264",
            VideoEncoder::H264Nvenc => "h264_nvenc",
            VideoEncoder::H264Qsv => "h264_qsv",
            VideoEncoder::H264Amf => "h264_amf",
            VideoEncoder::HevcNvenc => "hevc_nvenc",
            VideoEncoder::HevcQsv => "hevc_qsv",
            VideoEncoder::HevcAmf => "hevc_amf",
        }
    }

    /// Fixed preset for hardware encoders. Vendor preset vocabularies are
    /// incompatible with the x264 scale, so the user preset only applies to
    /// software encoding.
    pub fn fixed_preset(&self) -> Option<&'static str> {
        match self {
            VideoEncoder::X264 => None,
            VideoEncoder::H264Nvenc | VideoEncoder::HevcNvenc => Some(HW_PRESET_NVENC),
            VideoEncoder::H264Qsv | VideoEncoder::HevcQsv => Some(HW_PRESET_QSV),
            VideoEncoder::H264Amf | VideoEncoder::HevcAmf => Some(HW_PRESET_AMF),
        }
    }

    /// Maps a configured codec name, falling back to software.
    pub fn from_name(name: &str) -> Self {
        match name {
            "h264_nvenc" => VideoEncoder::H264Nvenc,
            "h264_qsv" => VideoEncoder::H264Qsv,
            "h264_amf" => VideoEncoder::H264Amf,
            "hevc_nvenc" => VideoEncoder::HevcNvenc,
            "hevc_qsv" => VideoEncoder::HevcQsv,
            "hevc_amf" => VideoEncoder::HevcAmf,
            _ => VideoEncoder::X264,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_to_codec() {
        assert_eq!(VideoEncoder::X264.as_ffmpeg_codec(), "libx264");
        assert_eq!(VideoEncoder::HevcNvenc.as_ffmpeg_codec(), "hevc_nvenc");
    }

    #[test]
    fn test_fixed_preset_only_for_hardware() {
        assert!(VideoEncoder::X264.fixed_preset().is_none());
        assert_eq!(VideoEncoder::H264Nvenc.fixed_preset(), Some("p4"));
        assert_eq!(VideoEncoder::HevcAmf.fixed_preset(), Some("balanced"));
    }

    #[test]
    fn test_from_name_fallback() {
        assert_eq!(VideoEncoder::from_name("h264_qsv"), VideoEncoder::H264Qsv);
        assert_eq!(VideoEncoder::from_name("mystery"), VideoEncoder::X264);
    }
}
