use super::{TrimJob, path_to_string};
use crate::editor::crop::CropPixels;

const VIDEO_CODEC: &str = "libx264";
const VIDEO_PRESET: &str = "fast";
const VIDEO_CRF: &str = "23";
const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "128k";

/// Crop with width/height floored to even values (yuv420p needs them), and
/// never below 2 px.
pub fn even_crop(crop: CropPixels) -> CropPixels {
    CropPixels {
        width: (crop.width - crop.width % 2).max(2),
        height: (crop.height - crop.height % 2).max(2),
        ..crop
    }
}

pub fn build_trim_command(job: &TrimJob) -> Vec<String> {
    let input = path_to_string(&job.input);
    let output = path_to_string(&job.output);

    log::debug!(
        target: "clip_trim::ffmpeg::builder",
        "Building FFmpeg command: start={}s, duration={}s, crop={:?}, input={} -> output={}",
        job.start_secs,
        job.duration_secs,
        job.crop,
        input,
        output
    );

    let mut args = vec![
        "-nostdin".to_string(),
        "-y".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-ss".to_string(),
        job.start_secs.to_string(),
        "-i".to_string(),
        input,
        "-t".to_string(),
        job.duration_secs.to_string(),
    ];

    if let Some(crop) = job.crop.map(even_crop) {
        args.extend([
            "-vf".to_string(),
            format!("crop={}:{}:{}:{}", crop.width, crop.height, crop.x, crop.y),
        ]);
    }

    args.extend([
        "-c:v".to_string(),
        VIDEO_CODEC.to_string(),
        "-preset".to_string(),
        VIDEO_PRESET.to_string(),
        "-crf".to_string(),
        VIDEO_CRF.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        AUDIO_CODEC.to_string(),
        "-b:a".to_string(),
        AUDIO_BITRATE.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);

    args.push(output);
    args
}

/// Formats args for readable display: option and value on the same line when the next arg is a value.
pub fn format_args_for_display_multiline(args: &[String]) -> String {
    let mut lines = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg.starts_with('-') && args.get(i + 1).is_some_and(|next| !next.starts_with('-')) {
            lines.push(format!("  {} {}", arg, args[i + 1]));
            i += 2;
        } else {
            lines.push(format!("  {}", arg));
            i += 1;
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job() -> TrimJob {
        TrimJob {
            input: PathBuf::from("/tmp/in.mp4"),
            output: PathBuf::from("/tmp/out.mp4"),
            start_secs: 1.5,
            duration_secs: 3.0,
            crop: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        let idx = args.iter().position(|a| a == flag)?;
        args.get(idx + 1).map(String::as_str)
    }

    #[test]
    fn seeks_before_input_and_limits_duration() {
        let args = build_trim_command(&job());
        let ss = args.iter().position(|a| a == "-ss").expect("-ss present");
        let i = args.iter().position(|a| a == "-i").expect("-i present");
        assert!(ss < i, "input seek must precede -i");
        assert_eq!(value_after(&args, "-ss"), Some("1.5"));
        assert_eq!(value_after(&args, "-i"), Some("/tmp/in.mp4"));
        assert_eq!(value_after(&args, "-t"), Some("3"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn no_crop_means_no_filter() {
        let args = build_trim_command(&job());
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn crop_adds_filter_in_ffmpeg_order() {
        let mut j = job();
        j.crop = Some(CropPixels {
            x: 480,
            y: 270,
            width: 960,
            height: 540,
        });
        let args = build_trim_command(&j);
        assert_eq!(value_after(&args, "-vf"), Some("crop=960:540:480:270"));
    }

    #[test]
    fn odd_crop_dimensions_are_floored_to_even() {
        let crop = even_crop(CropPixels {
            x: 3,
            y: 5,
            width: 641,
            height: 1,
        });
        assert_eq!(
            crop,
            CropPixels {
                x: 3,
                y: 5,
                width: 640,
                height: 2,
            }
        );
    }

    #[test]
    fn output_is_faststart_h264() {
        let args = build_trim_command(&job());
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-movflags"), Some("+faststart"));
        assert_eq!(value_after(&args, "-progress"), Some("pipe:1"));
    }

    #[test]
    fn display_pairs_flags_with_values() {
        let args: Vec<String> = ["-y", "-i", "/in.mp4", "-an", "/out.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            format_args_for_display_multiline(&args),
            "  -y\n  -i /in.mp4\n  -an /out.mp4"
        );
    }
}
