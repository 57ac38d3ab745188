use std::{fs::canonicalize, path::PathBuf};

use iced::{
    Background, Border, Element, Event, Length, Subscription, Theme, alignment,
    border::Radius,
    event::listen_with,
    widget::{self, button, container, row, text},
};
use iced_aw::{Menu, menu::primary, menu_items};
use iced_aw::{
    menu::{self, Item},
    menu_bar,
};
use keybinds::{KeySeq, Keybind};
use rfd::FileDialog;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    CONFIG,
    config::BindableMessage,
    icons::{self, ButtonVariant, icon_button},
    outline::{
        export::{copy_to_clipboard, write_outline},
        transform::TransformOptions,
        widget::{OutlineMessage, OutlineViewer},
    },
    watch::{WatchMessage, WatchNotification, file_watcher},
};

#[derive(Debug)]
pub struct App {
    outline: OutlineViewer,
    file_watcher: Option<mpsc::Sender<WatchMessage>>,
    pub dark_mode: bool,
    /// Outcome of the last export or copy, shown in the header
    export_notice: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub enum AppMessage {
    OpenFile(PathBuf),
    CloseFile,
    OpenNewFileFinder,
    ExportOutline,
    CopyOutline,
    Outline(OutlineMessage),
    FileWatcher(WatchNotification),
    ToggleDarkModeUi,
    Debug(String),
    #[default]
    None,
}

impl App {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            outline: OutlineViewer::new(options),
            file_watcher: None,
            dark_mode: true,
            export_notice: None,
        }
    }

    pub fn title(&self) -> String {
        match self.outline.document().and_then(|p| p.file_name()) {
            Some(name) => format!("{} - miro-outline", name.to_string_lossy()),
            None => "miro-outline".to_owned(),
        }
    }

    pub fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::TokyoNight
        } else {
            Theme::Light
        }
    }

    pub fn update(&mut self, message: AppMessage) -> iced::Task<AppMessage> {
        match message {
            AppMessage::OpenFile(path_buf) => {
                let path_buf = match canonicalize(&path_buf) {
                    Ok(p) => p,
                    Err(e) => {
                        error!("Could not open {path_buf:?}: {e}");
                        self.export_notice = Some(format!("Could not open {}", path_buf.display()));
                        return iced::Task::none();
                    }
                };
                info!("Opening {path_buf:?}");
                if let Some(old) = self.outline.document().cloned() {
                    self.send_watch(WatchMessage::StopWatch(old));
                }
                self.send_watch(WatchMessage::StartWatch(path_buf.clone()));
                self.export_notice = None;
                self.outline
                    .set_document(Some(path_buf))
                    .map(AppMessage::Outline)
            }
            AppMessage::CloseFile => {
                if let Some(old) = self.outline.document().cloned() {
                    self.send_watch(WatchMessage::StopWatch(old));
                }
                self.export_notice = None;
                self.outline.set_document(None).map(AppMessage::Outline)
            }
            AppMessage::OpenNewFileFinder => {
                if let Some(path_buf) = FileDialog::new().add_filter("Pdf", &["pdf"]).pick_file() {
                    iced::Task::done(AppMessage::OpenFile(path_buf))
                } else {
                    iced::Task::none()
                }
            }
            AppMessage::ExportOutline => {
                self.export();
                iced::Task::none()
            }
            AppMessage::CopyOutline => {
                self.export_notice = match copy_to_clipboard(self.outline.outline()) {
                    Ok(true) => Some("Copied outline to clipboard".to_owned()),
                    Ok(false) => None,
                    Err(e) => {
                        error!("Failed to copy outline to clipboard: {e:#}");
                        Some("Could not copy outline".to_owned())
                    }
                };
                iced::Task::none()
            }
            AppMessage::Outline(msg) => self.outline.update(msg).map(AppMessage::Outline),
            AppMessage::FileWatcher(watch_notification) => match watch_notification {
                WatchNotification::Ready(sender) => {
                    self.file_watcher = Some(sender);
                    if let Some(doc) = self.outline.document().cloned() {
                        self.send_watch(WatchMessage::StartWatch(doc));
                    }
                    iced::Task::none()
                }
                WatchNotification::Changed(path_buf) => {
                    if self.outline.document() == Some(&path_buf) {
                        info!("{path_buf:?} changed on disk, reloading outline");
                        self.outline.reload().map(AppMessage::Outline)
                    } else {
                        iced::Task::none()
                    }
                }
            },
            AppMessage::ToggleDarkModeUi => {
                self.dark_mode = !self.dark_mode;
                iced::Task::none()
            }
            AppMessage::Debug(s) => {
                debug!("{s}");
                iced::Task::none()
            }
            AppMessage::None => iced::Task::none(),
        }
    }

    /// Asks where to save the outline and writes it there. Does nothing until an outline is loaded.
    fn export(&mut self) {
        let Some(outline) = self.outline.outline() else {
            debug!("Export requested without a loaded outline");
            return;
        };
        let export_name = match CONFIG.read() {
            Ok(cfg) => cfg.export_name.clone(),
            Err(e) => e.into_inner().export_name.clone(),
        };
        let Some(target) = FileDialog::new()
            .set_file_name(&export_name)
            .add_filter("Json", &["json"])
            .save_file()
        else {
            return;
        };
        self.export_notice = match write_outline(outline, &target) {
            Ok(path) => Some(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Export failed: {e:#}");
                Some(format!("Could not save {}", target.display()))
            }
        };
    }

    fn send_watch(&self, msg: WatchMessage) {
        let watch_enabled = CONFIG.read().map(|c| c.watch_file).unwrap_or(false);
        if !watch_enabled {
            return;
        }
        if let Some(sender) = &self.file_watcher
            && let Err(e) = sender.try_send(msg)
        {
            warn!("Could not reach the file watcher: {e}");
        }
    }

    pub fn view(&self) -> iced::Element<'_, AppMessage> {
        let menu_tpl = |items| Menu::new(items).max_width(220.0).offset(0.0).spacing(0.0);
        let binding = |msg| CONFIG.read().ok().and_then(|cfg| cfg.get_binding_for_msg(msg));

        #[rustfmt::skip]
        let mb = container(
            menu_bar!((
                bar_button("File"),
                menu_tpl(menu_items!(
                    (menu_button("Open", AppMessage::OpenNewFileFinder, binding(BindableMessage::OpenFile)))
                    (menu_button("Export outline", AppMessage::ExportOutline, binding(BindableMessage::ExportOutline)))
                    (menu_button("Copy outline json", AppMessage::CopyOutline, binding(BindableMessage::CopyOutline)))
                    (menu_button("Close", AppMessage::CloseFile, None))
                ))
            )(
                bar_button("View"),
                menu_tpl(menu_items!(
                    (menu_button(
                        "Expand all",
                        AppMessage::Outline(OutlineMessage::ExpandAll),
                        binding(BindableMessage::ExpandAll)
                    ))
                    (menu_button(
                        "Collapse all",
                        AppMessage::Outline(OutlineMessage::CollapseAll),
                        binding(BindableMessage::CollapseAll)
                    ))
                    (menu_button(
                        if self.dark_mode { "Light Interface" } else { "Dark Interface" },
                        AppMessage::ToggleDarkModeUi,
                        None
                    ))
                ))
            ))
            .draw_path(menu::DrawPath::Backdrop)
            .style(
                |theme: &iced::Theme, status: iced_aw::style::Status| menu::Style {
                    menu_background_expand: 0.0.into(),
                    bar_background_expand: 0.0.into(),
                    bar_background: Background::Color(
                        theme.extended_palette().secondary.base.color,
                    ),
                    menu_border: Border {
                        radius: Radius::new(0.0),
                        ..Default::default()
                    },
                    ..primary(theme, status)
                },
            ),
        )
        .width(Length::Fill)
        .style(|theme| container::Style {
            background: Some(Background::Color(
                theme.extended_palette().secondary.base.color,
            )),
            ..Default::default()
        });

        let mut header = row![
            widget::svg(icons::table_of_contents()).width(20.0).height(20.0),
            text("Outline").size(18.0),
            widget::horizontal_space(),
        ]
        .spacing(6.0)
        .padding([4, 8])
        .align_y(alignment::Vertical::Center);
        if let Some(notice) = &self.export_notice {
            header = header.push(text(notice.as_str()).size(13.0));
        }
        let export = icon_button(icons::export(), ButtonVariant::Primary);
        header = header.push(if self.outline.outline().is_some() {
            export.on_press(AppMessage::ExportOutline)
        } else {
            export
        });

        widget::column![mb, header, self.outline.view().map(AppMessage::Outline)].into()
    }

    pub fn subscription(&self) -> Subscription<AppMessage> {
        let keys = listen_with(|event, status, _| match (event, status) {
            (Event::Keyboard(e), iced::event::Status::Ignored) => {
                let mut config = CONFIG.write().ok()?;
                config.keyboard.dispatch(e).map(|x| (*x).into())
            }
            _ => None,
        });

        let mut subs = vec![keys];
        if CONFIG.read().map(|c| c.watch_file).unwrap_or(false) {
            subs.push(Subscription::run(file_watcher).map(AppMessage::FileWatcher));
        }
        Subscription::batch(subs)
    }
}

fn base_button<'a>(
    content: impl Into<Element<'a, AppMessage>>,
    msg: AppMessage,
) -> button::Button<'a, AppMessage> {
    button(content)
        .padding([4, 8])
        .style(iced::widget::button::primary)
        .on_press(msg)
}

fn bar_button(label: &str) -> button::Button<'_, AppMessage> {
    base_button(
        text(label).align_y(alignment::Vertical::Center),
        AppMessage::Debug(format!("{label} menu")),
    )
    .width(Length::Shrink)
    .style(move |theme, status| {
        let palette = theme.extended_palette();
        let pair = match status {
            button::Status::Active => palette.secondary.base,
            button::Status::Hovered => palette.secondary.weak,
            button::Status::Pressed => palette.secondary.strong,
            button::Status::Disabled => palette.secondary.weak,
        };
        button::Style {
            text_color: pair.text,
            background: Some(Background::Color(pair.color)),
            ..Default::default()
        }
    })
}

pub fn format_key_sequence(seq: &KeySeq) -> String {
    let parts: Vec<String> = seq.as_slice().iter().map(|inp| inp.to_string()).collect();
    format!("({})", parts.join(" "))
}

fn menu_button(
    label: &str,
    msg: AppMessage,
    binding: Option<Keybind<BindableMessage>>,
) -> button::Button<'_, AppMessage> {
    let txt = format!(
        " {}",
        binding.map_or(String::new(), |b| format_key_sequence(&b.seq))
    );
    base_button(
        row![
            text(label),
            text(txt).style(|theme: &Theme| {
                let palette = theme.extended_palette();
                text::Style {
                    color: Some(palette.primary.base.color),
                }
            })
        ],
        msg,
    )
    .width(Length::Fill)
    .style(move |theme, status| {
        let palette = theme.extended_palette();
        let pair = match status {
            button::Status::Active => palette.background.base,
            button::Status::Hovered => palette.background.weak,
            button::Status::Pressed => palette.background.strong,
            button::Status::Disabled => palette.secondary.weak,
        };
        button::Style {
            text_color: pair.text,
            background: Some(Background::Color(pair.color)),
            ..Default::default()
        }
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use keybinds::KeyInput;

    use super::*;

    #[test]
    fn key_sequences_are_shown_in_parens() {
        let bind = Keybind::new(
            [
                KeyInput::from_str("Ctrl+e").unwrap(),
                KeyInput::from_str("j").unwrap(),
            ],
            BindableMessage::ExportOutline,
        );
        let shown = format_key_sequence(&bind.seq);
        assert!(shown.starts_with('(') && shown.ends_with(')'), "{shown}");
        assert_eq!(shown.matches(' ').count(), 1);
    }

    #[test]
    fn export_without_outline_is_a_no_op() {
        let mut app = App::new(TransformOptions::default());
        let _ = app.update(AppMessage::ExportOutline);
        assert!(app.export_notice.is_none());
        let _ = app.update(AppMessage::CopyOutline);
        assert!(app.export_notice.is_none());
    }

    #[test]
    fn opening_a_missing_file_reports_it() {
        let mut app = App::new(TransformOptions::default());
        let _ = app.update(AppMessage::OpenFile("no/such/file.pdf".into()));
        assert!(app.outline.document().is_none());
        assert!(app.export_notice.unwrap().contains("Could not open"));
    }

    #[test]
    fn title_follows_the_open_document() {
        let app = App::new(TransformOptions::default());
        assert_eq!(app.title(), "miro-outline");
    }
}
