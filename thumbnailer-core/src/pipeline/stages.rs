// ============================================================================
// thumbnailer-core/src/pipeline/stages.rs
// ============================================================================
//
// STAGE TEMPLATES: Declarative Command Construction
//
// Each stage is described by a pure function from the job's paths to a
// fully resolved `Stage`. Nothing here touches the filesystem or spawns a
// process, so the exact argument vectors can be checked in unit tests.
//
// COMMAND SHAPE:
//   <transcoder> <global args> -i <input> -sws_flags <flags>
//       -filter_complex <graph> <encode args...> <output>
//
// The output path is always the last argument of a rendering command; the
// stage executor relies on that to redirect it to a temporary sibling.

use std::path::Path;

use crate::stage::{Stage, StageName};

/// Arguments placed right after the program on every command.
const GLOBAL_ARGS: [&str; 4] = ["-hide_banner", "-nostdin", "-y", "-nostats"];

const SWS_FLAGS: &str = "spline+accurate_rnd+full_chroma_int";

/// Hardware HEVC encode shared by every rendering command.
const ENCODE_ARGS: [&str; 30] = [
    "-c:v",
    "hevc_videotoolbox",
    "-profile:v",
    "main",
    "-tag:v",
    "hvc1",
    "-pix_fmt",
    "yuv420p",
    "-allow_sw",
    "1",
    "-g",
    "30",
    "-b:v",
    "0",
    "-q:v",
    "50",
    "-map",
    "0:a?",
    "-map_metadata:s:a:0",
    "0:s:a:0",
    "-c:a",
    "copy",
    "-map_metadata",
    "0",
    "-map_metadata:s:v",
    "0:s:v",
    "-movflags",
    "frag_keyframe+empty_moov+delay_moov+use_metadata_tags+write_colr",
    "-bf",
    "0",
];

const STABILIZE_METADATA: &str =
    "videoai=Stabilized auto-crop fixing rolling shutter and with smoothness 100";

/// Paths a job's stages are built from.
#[derive(Debug, Clone, Copy)]
pub struct StagePaths<'a> {
    /// Transcoder executable
    pub transcoder: &'a Path,
    /// Absolute input video path
    pub input: &'a Path,
    /// Absolute LUT path
    pub lut: &'a Path,
}

// ============================================================================
// FILTER GRAPHS
// ============================================================================

/// Frame-rate normalisation and downscale, shared by all renders.
fn base_filters() -> [String; 2] {
    ["fps=ntsc".to_string(), "scale=1920:-1".to_string()]
}

/// Colour grade followed by brightness normalisation.
fn grade_filters(lut: &Path) -> [String; 2] {
    [
        format!("lut3d=file='{}'", lut.display()),
        "normalize=smoothing=300:independence=0".to_string(),
    ]
}

fn analysis_filter(transient: &Path) -> String {
    format!(
        "tvai_cpe=model=cpe-2:filename='{}':device=-2",
        transient.display()
    )
}

fn stabilize_filter(transient: &Path) -> String {
    format!(
        concat!(
            "tvai_stb=model=ref-2:filename='{}':smoothness=12:rst=0:wst=0:cache=128:dof=1111",
            ":ws=32:full=0:roll=1:reduce=0:device=-2:vram=1:instances=1",
        ),
        transient.display()
    )
}

// ============================================================================
// COMMAND BUILDING
// ============================================================================

/// Common head of every command: program, global args, input, scaler, graph.
fn command_head(paths: &StagePaths<'_>, graph: String) -> Vec<String> {
    let mut cmd = vec![paths.transcoder.display().to_string()];
    cmd.extend(GLOBAL_ARGS.iter().map(|s| s.to_string()));
    cmd.extend([
        "-i".to_string(),
        paths.input.display().to_string(),
        "-sws_flags".to_string(),
        SWS_FLAGS.to_string(),
        "-filter_complex".to_string(),
        graph,
    ]);
    cmd
}

fn render_command(
    paths: &StagePaths<'_>,
    graph: String,
    extra: &[&str],
    output: &Path,
) -> Vec<String> {
    let mut cmd = command_head(paths, graph);
    cmd.extend(ENCODE_ARGS.iter().map(|s| s.to_string()));
    cmd.extend(extra.iter().map(|s| s.to_string()));
    cmd.push(output.display().to_string());
    cmd
}

/// Two-pass stabilization: motion analysis into `transient`, then a
/// stabilized, graded render that reads it back.
pub fn stabilize(paths: &StagePaths<'_>, transient: &Path) -> Stage {
    let output = StageName::Stabilize.output_path(paths.input);

    let mut analysis = command_head(paths, analysis_filter(transient));
    analysis.extend(["-f", "null", "-"].map(String::from));

    let mut graph = vec![stabilize_filter(transient)];
    graph.extend(base_filters());
    graph.extend(grade_filters(paths.lut));
    let render = render_command(
        paths,
        graph.join(","),
        &["-metadata", STABILIZE_METADATA],
        &output,
    );

    Stage {
        name: StageName::Stabilize,
        output,
        commands: vec![analysis, render],
    }
}

/// Graded, non-stabilized preview.
pub fn preview(paths: &StagePaths<'_>) -> Stage {
    let output = StageName::Preview.output_path(paths.input);
    let mut graph = base_filters().to_vec();
    graph.extend(grade_filters(paths.lut));
    let render = render_command(paths, graph.join(","), &[], &output);

    Stage {
        name: StageName::Preview,
        output,
        commands: vec![render],
    }
}

/// Lightweight scaled proxy without colour grading.
pub fn proxy(paths: &StagePaths<'_>) -> Stage {
    let output = StageName::Proxy.output_path(paths.input);
    let render = render_command(paths, base_filters().join(","), &[], &output);

    Stage {
        name: StageName::Proxy,
        output,
        commands: vec![render],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GRADE: &str = "lut3d=file='/luts/grade.cube',normalize=smoothing=300:independence=0";

    fn paths() -> StagePaths<'static> {
        StagePaths {
            transcoder: Path::new("/opt/tvai/ffmpeg"),
            input: Path::new("/videos/clip.mp4"),
            lut: Path::new("/luts/grade.cube"),
        }
    }

    fn arg_after<'a>(cmd: &'a [String], flag: &str) -> &'a str {
        let idx = cmd.iter().position(|a| a == flag).unwrap();
        &cmd[idx + 1]
    }

    #[test]
    fn test_stabilize_has_analysis_then_render() {
        let stage = stabilize(&paths(), Path::new("/tmp/xclip.mp4_stab.json"));

        assert_eq!(stage.name, StageName::Stabilize);
        assert_eq!(stage.output, PathBuf::from("/videos/clip_thumbnailer_stab.mp4"));
        assert_eq!(stage.commands.len(), 2);

        let analysis = &stage.commands[0];
        assert_eq!(analysis[0], "/opt/tvai/ffmpeg");
        assert_eq!(&analysis[1..5], &GLOBAL_ARGS.map(String::from));
        assert_eq!(arg_after(analysis, "-i"), "/videos/clip.mp4");
        assert_eq!(
            arg_after(analysis, "-filter_complex"),
            "tvai_cpe=model=cpe-2:filename='/tmp/xclip.mp4_stab.json':device=-2"
        );
        assert_eq!(&analysis[analysis.len() - 3..], &["-f", "null", "-"].map(String::from));

        let render = &stage.commands[1];
        let graph = arg_after(render, "-filter_complex");
        assert!(graph.starts_with("tvai_stb=model=ref-2:filename='/tmp/xclip.mp4_stab.json':"));
        assert!(graph.ends_with(&format!(",fps=ntsc,scale=1920:-1,{GRADE}")));
        assert_eq!(arg_after(render, "-metadata"), STABILIZE_METADATA);
        assert_eq!(render.last().unwrap(), "/videos/clip_thumbnailer_stab.mp4");
    }

    #[test]
    fn test_preview_is_graded_without_stabilization() {
        let stage = preview(&paths());

        assert_eq!(stage.commands.len(), 1);
        let cmd = &stage.commands[0];
        assert_eq!(
            arg_after(cmd, "-filter_complex"),
            format!("fps=ntsc,scale=1920:-1,{GRADE}")
        );
        assert_eq!(arg_after(cmd, "-c:v"), "hevc_videotoolbox");
        assert_eq!(cmd.last().unwrap(), "/videos/clip_thumbnailer_preview.mp4");
    }

    #[test]
    fn test_proxy_has_no_grading() {
        let stage = proxy(&paths());

        let cmd = &stage.commands[0];
        assert_eq!(arg_after(cmd, "-filter_complex"), "fps=ntsc,scale=1920:-1");
        assert!(!cmd.iter().any(|a| a.contains("lut3d")));
        assert_eq!(cmd.last().unwrap(), "/videos/clip_Proxy.mp4");
        assert_eq!(stage.output, PathBuf::from("/videos/clip_Proxy.mp4"));
    }
}
