use std::{path::PathBuf, sync::Arc};

use iced::{
    Background, Element, Length, Theme, alignment,
    widget::{self, button, container, row, scrollable, text},
};
use tracing::{debug, error, info};

use crate::icons::{self, ButtonVariant, icon_button};

use super::{
    NodePath, OutlineAction, UiOutlineNode,
    extraction::{MupdfSource, OutlineSource},
    loader::{self, LoadStatus, OutlineLoader, OutlineRequest, OutlineResponse},
    transform::TransformOptions,
    tree::{RowKind, TreeRow, TreeState, visible_rows},
};

const INDENT_PX: f32 = 14.0;
const ROW_TEXT_SIZE: f32 = 14.0;

#[derive(Debug, Clone)]
pub enum OutlineMessage {
    Loaded(OutlineResponse),
    Toggle(NodePath),
    Select(NodePath),
    ExpandAll,
    CollapseAll,
    SelectNext,
    SelectPrevious,
    ToggleSelected,
    ActivateSelected,
}

/// The outline pane: owns the loader for the current document and the state of the tree.
#[derive(Debug, Default)]
pub struct OutlineViewer {
    loader: OutlineLoader,
    tree: TreeState,
    /// Result of the last activated entry, shown below the tree
    pub notice: Option<String>,
}

impl OutlineViewer {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            loader: OutlineLoader::new(options),
            ..Default::default()
        }
    }

    pub fn document(&self) -> Option<&PathBuf> {
        self.loader.document()
    }

    pub fn outline(&self) -> Option<&[UiOutlineNode]> {
        self.loader.outline()
    }

    pub fn set_document(&mut self, document: Option<PathBuf>) -> iced::Task<OutlineMessage> {
        let request = self.loader.set_document(document);
        if request.is_some() || self.loader.document().is_none() {
            self.tree.clear();
            self.notice = None;
        }
        request.map_or_else(iced::Task::none, spawn_fetch)
    }

    pub fn reload(&mut self) -> iced::Task<OutlineMessage> {
        self.loader
            .reload()
            .map_or_else(iced::Task::none, spawn_fetch)
    }

    pub fn update(&mut self, message: OutlineMessage) -> iced::Task<OutlineMessage> {
        match message {
            OutlineMessage::Loaded(response) => {
                if self.loader.apply(response)
                    && let Some(outline) = self.loader.outline()
                {
                    self.tree.prune(outline);
                }
            }
            OutlineMessage::Toggle(path) => {
                self.tree
                    .toggle(self.loader.outline().unwrap_or_default(), &path);
            }
            OutlineMessage::Select(path) => {
                self.tree.select(path.clone());
                self.activate(&path);
            }
            OutlineMessage::ExpandAll => {
                if let Some(outline) = self.loader.outline() {
                    self.tree.expand_all(outline);
                }
            }
            OutlineMessage::CollapseAll => self.tree.collapse_all(),
            OutlineMessage::SelectNext => {
                self.tree
                    .move_selection(self.loader.outline().unwrap_or_default(), 1);
            }
            OutlineMessage::SelectPrevious => {
                self.tree
                    .move_selection(self.loader.outline().unwrap_or_default(), -1);
            }
            OutlineMessage::ToggleSelected => {
                if let Some(path) = self.tree.selected().cloned() {
                    self.tree
                        .toggle(self.loader.outline().unwrap_or_default(), &path);
                }
            }
            OutlineMessage::ActivateSelected => {
                if let Some(path) = self.tree.selected().cloned() {
                    self.activate(&path);
                }
            }
        }
        iced::Task::none()
    }

    fn activate(&mut self, path: &NodePath) {
        let Some(node) = self
            .loader
            .outline()
            .and_then(|outline| UiOutlineNode::find(outline, path))
        else {
            return;
        };
        debug!("Activated outline entry {path} ({})", node.name);
        self.notice = match node.action() {
            OutlineAction::GoTo(dest) => Some(format!("{}: page {}", node.name, dest.page + 1)),
            OutlineAction::OpenUrl(url) => {
                info!("Opening {url}");
                match open::that(&url) {
                    Ok(()) => Some(format!("Opened {url}")),
                    Err(e) => {
                        error!("Failed to open {url}: {e}");
                        Some(format!("Could not open {url}"))
                    }
                }
            }
            OutlineAction::None => None,
        };
    }

    pub fn view(&self) -> Element<'_, OutlineMessage> {
        let controls = row![
            icon_button(icons::expand(), ButtonVariant::Subtle).on_press(OutlineMessage::ExpandAll),
            icon_button(icons::collapse(), ButtonVariant::Subtle)
                .on_press(OutlineMessage::CollapseAll),
        ]
        .spacing(4.0);

        let outline = self.loader.outline().unwrap_or_default();
        let rows = visible_rows(outline, &self.tree);

        let body: Element<'_, OutlineMessage> = match (self.loader.status(), rows.is_empty()) {
            (LoadStatus::Loading, true) => text("Loading outline...").into(),
            (LoadStatus::Loaded, true) => text("This document has no outline").into(),
            (LoadStatus::Idle, _) => text("No document open").into(),
            _ => scrollable(
                widget::Column::with_children(rows.into_iter().map(tree_row))
                    .spacing(1.0)
                    .width(Length::Fill),
            )
            .height(Length::Fill)
            .into(),
        };

        let mut column = widget::column![controls, body].spacing(6.0).padding(6.0);
        if let LoadStatus::Failed(e) = self.loader.status() {
            column = column.push(text(format!("Could not load outline: {e}")).style(text::danger));
        }
        if let Some(notice) = &self.notice {
            column = column.push(text(notice.as_str()).size(ROW_TEXT_SIZE));
        }

        container(column)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn spawn_fetch(request: OutlineRequest) -> iced::Task<OutlineMessage> {
    let source: Arc<dyn OutlineSource> = Arc::new(MupdfSource::new(request.document.clone()));
    iced::Task::perform(loader::fetch(request, source), OutlineMessage::Loaded)
}

fn tree_row(row: TreeRow<'_>) -> Element<'_, OutlineMessage> {
    let chevron: Element<'_, OutlineMessage> = match row.kind {
        RowKind::Folder { expanded } => button(text(if expanded { "▾" } else { "▸" }).size(ROW_TEXT_SIZE))
            .padding([0, 4])
            .style(button::text)
            .on_press(OutlineMessage::Toggle(row.path.clone()))
            .into(),
        RowKind::Leaf => widget::Space::with_width(Length::Fixed(INDENT_PX + 4.0)).into(),
    };

    let selected = row.selected;
    let label = button(
        text(row.name)
            .size(ROW_TEXT_SIZE)
            .align_y(alignment::Vertical::Center),
    )
    .padding([2, 4])
    .width(Length::Fill)
    .on_press(OutlineMessage::Select(row.path.clone()))
    .style(move |theme: &Theme, status| {
        let palette = theme.extended_palette();
        let pair = match (selected, status) {
            (true, _) => palette.primary.weak,
            (false, button::Status::Hovered) => palette.background.weak,
            (false, button::Status::Pressed) => palette.background.strong,
            (false, _) => palette.background.base,
        };
        button::Style {
            text_color: pair.text,
            background: Some(Background::Color(pair.color)),
            ..Default::default()
        }
    });

    row![
        widget::Space::with_width(Length::Fixed(INDENT_PX * row.depth() as f32)),
        chevron,
        label
    ]
    .align_y(alignment::Vertical::Center)
    .into()
}
