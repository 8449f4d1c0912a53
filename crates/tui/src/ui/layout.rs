use ratatui::layout::{Constraint, Direction, Layout, Rect};

use super::panel::{Panel, PanelType};

const MIN_VIEWER_WIDTH: u16 = 30;
const MAX_VIEWER_WIDTH: u16 = 70;
const TOPBAR_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 3;

/// Split between the document viewer and the explanation panel. The divider
/// can be dragged with the mouse.
pub struct LayoutState {
    viewer_width: u16,
    cached_panels: Vec<Panel>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            viewer_width: 40,
            cached_panels: Vec::new(),
        }
    }
}

impl LayoutState {
    pub fn calculate_layout(&mut self, area: Rect) -> &[Panel] {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TOPBAR_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(self.viewer_width), Constraint::Min(20)])
            .split(rows[1]);

        self.cached_panels = vec![
            Panel {
                panel_type: PanelType::Topbar,
                rect: rows[0],
            },
            Panel {
                panel_type: PanelType::Viewer,
                rect: columns[0],
            },
            Panel {
                panel_type: PanelType::Explanation,
                rect: columns[1],
            },
            Panel {
                panel_type: PanelType::StatusBar,
                rect: rows[2],
            },
        ];

        &self.cached_panels
    }

    pub fn get_panels(&self) -> &[Panel] {
        &self.cached_panels
    }

    pub fn viewer_width(&self) -> u16 {
        self.viewer_width
    }

    pub fn handle_drag(&mut self, delta: i16) {
        self.viewer_width = (self.viewer_width as i16 + delta)
            .clamp(MIN_VIEWER_WIDTH as i16, MAX_VIEWER_WIDTH as i16) as u16;
    }

    /// True when `column` sits on the border between viewer and explanation.
    pub fn is_on_divider(&self, column: u16, row: u16) -> bool {
        self.cached_panels
            .iter()
            .find(|p| p.panel_type == PanelType::Viewer)
            .map(|p| {
                let edge = p.rect.x + p.rect.width;
                row >= p.rect.y
                    && row < p.rect.y + p.rect.height
                    && (column + 1 == edge || column == edge)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_four_panels() {
        let mut layout = LayoutState::default();
        let panels = layout.calculate_layout(Rect::new(0, 0, 120, 40));
        let kinds: Vec<PanelType> = panels.iter().map(|p| p.panel_type).collect();
        assert_eq!(
            kinds,
            vec![
                PanelType::Topbar,
                PanelType::Viewer,
                PanelType::Explanation,
                PanelType::StatusBar
            ]
        );
        assert_eq!(panels[1].rect.width, 40);
        assert_eq!(panels[2].rect.width, 80);
    }

    #[test]
    fn drag_is_clamped() {
        let mut layout = LayoutState::default();
        layout.handle_drag(-100);
        assert_eq!(layout.viewer_width(), MIN_VIEWER_WIDTH);
        layout.handle_drag(100);
        assert_eq!(layout.viewer_width(), MAX_VIEWER_WIDTH);
    }

    #[test]
    fn divider_hit_test() {
        let mut layout = LayoutState::default();
        layout.calculate_layout(Rect::new(0, 0, 120, 40));
        assert!(layout.is_on_divider(39, 10));
        assert!(layout.is_on_divider(40, 10));
        assert!(!layout.is_on_divider(20, 10));
        assert!(!layout.is_on_divider(40, 0));
    }
}
