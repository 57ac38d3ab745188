use anyhow::{Result, anyhow, bail};
use std::{fs, path::PathBuf, str::FromStr};

use keybinds::{KeyInput, Keybind, Keybinds};
use logos::Logos;
use strum::EnumString;

use crate::{
    app::AppMessage,
    outline::{
        DEFAULT_MAX_DEPTH, IdScheme, export::DEFAULT_EXPORT_NAME, transform::TransformOptions,
        widget::OutlineMessage,
    },
};

// Every menu entry that can be triggered from the keyboard has a BindableMessage, which is how
// the menu finds the binding to display next to its label.

#[derive(Debug, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum BindableMessage {
    OpenFile,
    ExportOutline,
    CopyOutline,
    ExpandAll,
    CollapseAll,
    SelectNext,
    SelectPrevious,
    ToggleSelected,
    ActivateSelected,
}

impl From<BindableMessage> for AppMessage {
    fn from(val: BindableMessage) -> Self {
        match val {
            BindableMessage::OpenFile => AppMessage::OpenNewFileFinder,
            BindableMessage::ExportOutline => AppMessage::ExportOutline,
            BindableMessage::CopyOutline => AppMessage::CopyOutline,
            BindableMessage::ExpandAll => AppMessage::Outline(OutlineMessage::ExpandAll),
            BindableMessage::CollapseAll => AppMessage::Outline(OutlineMessage::CollapseAll),
            BindableMessage::SelectNext => AppMessage::Outline(OutlineMessage::SelectNext),
            BindableMessage::SelectPrevious => AppMessage::Outline(OutlineMessage::SelectPrevious),
            BindableMessage::ToggleSelected => AppMessage::Outline(OutlineMessage::ToggleSelected),
            BindableMessage::ActivateSelected => {
                AppMessage::Outline(OutlineMessage::ActivateSelected)
            }
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub keyboard: Keybinds<BindableMessage>,
    pub id_scheme: IdScheme,
    pub max_depth: usize,
    pub export_name: String,
    pub watch_file: bool,
}

impl Config {
    pub fn new() -> Self {
        Config {
            keyboard: Keybinds::new(vec![]),
            ..Default::default()
        }
    }

    pub fn get_binding_for_msg(&self, msg: BindableMessage) -> Option<Keybind<BindableMessage>> {
        let binds = self.keyboard.as_slice();
        binds.iter().find(|b| b.action == msg).cloned()
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            id_scheme: self.id_scheme,
            max_depth: self.max_depth,
        }
    }

    pub fn from_file(path: PathBuf) -> Result<Self> {
        Ok(Self::merge_configs(
            Self::default(),
            Config::from_str(&fs::read_to_string(path)?)?,
        ))
    }

    pub fn system_config_path() -> Result<PathBuf> {
        Ok(home::home_dir()
            .ok_or(anyhow!("No home directory could be determined"))?
            .join("./.config/miro-outline/miro-outline.conf"))
    }

    fn merge_configs(mut base: Config, overrider: Config) -> Config {
        for binding in overrider.keyboard.into_vec() {
            base.keyboard.push(binding);
        }
        base.id_scheme = overrider.id_scheme;
        base.max_depth = overrider.max_depth;
        base.export_name = overrider.export_name;
        base.watch_file = overrider.watch_file;
        base
    }

    fn apply_statement(&mut self, cmd: &str, args: &[String]) -> Result<()> {
        let cmd = Command::from_str(cmd).map_err(|_| anyhow!("Unknown command {cmd:?}"))?;
        if args.len() != 2 {
            bail!("{cmd:?} requires two arguments, got {}", args.len());
        }
        match cmd {
            Command::Bind => {
                let action = BindableMessage::from_str(&args[1])
                    .map_err(|_| anyhow!("Unknown action {:?}", args[1]))?;
                self.keyboard
                    .bind(&args[0], action)
                    .map_err(|e| anyhow!("Invalid key sequence {:?}: {e}", args[0]))?;
            }
            Command::Set => match args[0].as_str() {
                "IdScheme" => {
                    self.id_scheme = IdScheme::from_str(&args[1])
                        .map_err(|_| anyhow!("IdScheme must be Sibling or Path"))?;
                }
                "MaxDepth" => {
                    self.max_depth = args[1]
                        .parse::<usize>()
                        .ok()
                        .filter(|d| *d > 0)
                        .ok_or(anyhow!("MaxDepth must be a positive integer"))?;
                }
                "ExportName" => {
                    self.export_name = args[1].clone();
                }
                "WatchFile" => {
                    self.watch_file = match args[1].as_str() {
                        "True" => true,
                        "False" => false,
                        _ => bail!("WatchFile must be True or False"),
                    };
                }
                other => bail!("Unknown setting {other:?}"),
            },
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let bind = |keys: &str, action| {
            Keybind::new(
                KeyInput::from_str(keys).expect("default key bindings are valid"),
                action,
            )
        };
        Config {
            keyboard: Keybinds::new(vec![
                bind("Ctrl+o", BindableMessage::OpenFile),
                bind("Ctrl+e", BindableMessage::ExportOutline),
                bind("y", BindableMessage::CopyOutline),
                bind("E", BindableMessage::ExpandAll),
                bind("C", BindableMessage::CollapseAll),
                bind("j", BindableMessage::SelectNext),
                bind("k", BindableMessage::SelectPrevious),
                bind("o", BindableMessage::ToggleSelected),
                bind("g", BindableMessage::ActivateSelected),
            ]),
            id_scheme: IdScheme::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            export_name: DEFAULT_EXPORT_NAME.to_owned(),
            watch_file: true,
        }
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lexer = Token::lexer(s);

        let mut expecting_statement = true;
        let mut line = 1;

        let mut cmd_name: Option<String> = None;
        let mut args = vec![];

        let mut out = Config::new();

        for token in lexer {
            match token {
                Ok(Token::String(s)) => {
                    if expecting_statement {
                        cmd_name = Some(s);
                    } else {
                        args.push(s);
                    }
                }
                Ok(Token::StatementDelim) => {
                    if let Some(cmd) = cmd_name.take() {
                        out.apply_statement(&cmd, &args)
                            .map_err(|e| anyhow!("Line {line}: {e}"))?;
                    }
                    expecting_statement = true;
                    args.clear();
                    line += 1;
                }
                Ok(Token::ArgDelim) => {
                    expecting_statement = cmd_name.is_none();
                }
                Err(()) => bail!("Line {line}: unreadable token"),
            }
        }
        // The last statement may lack a trailing newline
        if let Some(cmd) = cmd_name {
            out.apply_statement(&cmd, &args)
                .map_err(|e| anyhow!("Line {line}: {e}"))?;
        }
        Ok(out)
    }
}

/// Represents valid tokens in a configuration file.
#[derive(Debug, Logos)]
enum Token {
    #[regex(" +")]
    ArgDelim,

    #[token("\n")]
    StatementDelim,

    #[regex("[^ \n]+", |lex| lex.slice().to_owned())]
    String(String),
}

#[derive(Debug, EnumString)]
enum Command {
    Bind,
    Set,
}
