//! Runtime configuration, resolved once from the command line.

use std::path::PathBuf;

use tessel_render::FaceDesc;

use crate::cli::Cli;

/// Where terminal bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
    Exec(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Outline redrawn cells.
    pub show_dirty: bool,
    /// Snap the window size to a cell multiple on resize.
    pub snap_size: bool,
    /// Scrollback history in lines.
    pub scrollback: usize,
    pub face: FaceDesc,
    pub width: u32,
    pub height: u32,
    pub input: Input,
    pub output: PathBuf,
    pub frames: u32,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let input = match (&cli.exec, &cli.input) {
            (Some(cmd), _) => Input::Exec(cmd.clone()),
            (None, Some(path)) if path.as_os_str() != "-" => Input::File(path.clone()),
            _ => Input::Stdin,
        };

        let mut face = FaceDesc::new(cli.font.clone());
        face.size = cli.font_size;
        face.bold = cli.bold.then_some(true);
        face.italic = cli.italic.then_some(true);

        Self {
            show_dirty: cli.show_dirty,
            snap_size: cli.snap_size,
            scrollback: usize::try_from(cli.sb_size.max(0)).unwrap_or(usize::MAX),
            face,
            width: cli.width.max(1),
            height: cli.height.max(1),
            input,
            output: cli.output.clone(),
            frames: cli.frames.max(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_dirty: false,
            snap_size: false,
            scrollback: tessel_term::DEFAULT_SCROLLBACK,
            face: FaceDesc::default(),
            width: 800,
            height: 600,
            input: Input::Stdin,
            output: PathBuf::from("tessel.png"),
            frames: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(std::iter::once("tessel").chain(args.iter().copied())).unwrap();
        Config::from_cli(&cli)
    }

    #[test]
    fn test_negative_scrollback_clamps_to_zero() {
        assert_eq!(config(&["--sb-size", "-10"]).scrollback, 0);
        assert_eq!(config(&["--sb-size", "50"]).scrollback, 50);
        assert_eq!(config(&[]).scrollback, 2000);
    }

    #[test]
    fn test_unset_flags_are_dont_care() {
        let face = config(&["--font", "Mono Bold 12"]).face;
        assert_eq!(face.desc, "Mono Bold 12");
        assert_eq!(face.size, None);
        assert_eq!(face.bold, None);
        assert_eq!(face.italic, None);

        let face = config(&["--italic", "--font-size", "20"]).face;
        assert_eq!(face.size, Some(20));
        assert_eq!(face.italic, Some(true));
    }

    #[test]
    fn test_input_selection() {
        assert_eq!(config(&[]).input, Input::Stdin);
        assert_eq!(config(&["-"]).input, Input::Stdin);
        assert_eq!(config(&["log.txt"]).input, Input::File("log.txt".into()));
        assert_eq!(config(&["--exec", "ls -l"]).input, Input::Exec("ls -l".into()));
    }

    #[test]
    fn test_toggles() {
        let config = config(&["--show-dirty", "--snap-size", "--frames", "0"]);
        assert!(config.show_dirty);
        assert!(config.snap_size);
        assert_eq!(config.frames, 1);
    }
}
