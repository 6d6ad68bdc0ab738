//! Action Board Widget
//! Central scrollable area with one header per analysis module, its
//! recommendation cards, and the detail popovers opened from them.

use crate::catalog::{ActionCatalog, CardColor};
use crate::session::{PopupKey, SessionState, StatusMessage};
use egui::{Color32, ComboBox, RichText, ScrollArea, Stroke};

const CARD_SPACING: f32 = 12.0;
const HEADER_COLOR: Color32 = Color32::from_rgb(246, 187, 77);

/// What the user asked for this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    None,
    Send(PopupKey),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PopoverAction {
    None,
    Send,
    Cancel,
}

/// Cards laid out two per row, grouped by module.
#[derive(Default)]
pub struct ActionBoard;

impl ActionBoard {
    pub fn new() -> Self {
        Self
    }

    /// Draw the card grid and the status banner.
    pub fn show(&mut self, ui: &mut egui::Ui, catalog: &ActionCatalog, session: &mut SessionState) {
        ui.label(
            RichText::new("Immediate Next Action Plan")
                .size(26.0)
                .strong()
                .color(Color32::WHITE),
        );
        ui.label(
            RichText::new("Insights & action assignments with email notifications.")
                .size(13.0)
                .color(Color32::LIGHT_GRAY),
        );
        ui.add_space(8.0);

        Self::draw_status(ui, session);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, module) in catalog.modules.iter().enumerate() {
                    ui.add_space(CARD_SPACING);
                    ui.label(RichText::new(&module.name).size(20.0).strong().color(HEADER_COLOR));
                    ui.label(RichText::new("Key Recommendations").size(11.0).color(Color32::GRAY));
                    ui.separator();
                    ui.add_space(6.0);

                    let color = catalog.card_color(idx);
                    for pair in module.actions.chunks(2) {
                        ui.columns(2, |cols| {
                            for (col, action) in cols.iter_mut().zip(pair) {
                                let key = PopupKey::new(&module.name, action);
                                if Self::draw_card(col, action, color, &key) {
                                    session.toggle(&key);
                                }
                            }
                        });
                        ui.add_space(CARD_SPACING);
                    }
                }
            });
    }

    /// Draw every open popover as a floating window.
    pub fn show_popovers(
        &mut self,
        ctx: &egui::Context,
        catalog: &ActionCatalog,
        session: &mut SessionState,
    ) -> BoardAction {
        let mut result = BoardAction::None;

        for key in session.open_popovers() {
            let bullets = catalog.next_actions(&key.action);
            let state = session.popover_mut(&key);
            let mut action = PopoverAction::None;

            egui::Window::new(RichText::new(&key.action).strong())
                .id(egui::Id::new(key.id()))
                .collapsible(false)
                .resizable(true)
                .default_width(520.0)
                .show(ctx, |ui| {
                    ui.label(
                        RichText::new("Next Actions to Be Taken")
                            .size(18.0)
                            .strong()
                            .color(HEADER_COLOR),
                    );
                    ui.add_space(6.0);

                    ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                        for bullet in bullets {
                            egui::Frame::none()
                                .fill(Color32::from_rgb(147, 51, 234))
                                .rounding(8.0)
                                .inner_margin(10.0)
                                .show(ui, |ui| {
                                    ui.set_width(ui.available_width());
                                    ui.label(RichText::new(bullet).color(Color32::WHITE));
                                });
                            ui.add_space(6.0);
                        }
                    });

                    ui.separator();
                    ui.label("Add further specific instructions or planned steps:");
                    ui.add(
                        egui::TextEdit::multiline(&mut state.instructions)
                            .hint_text("E.g. Assign tasks, request weekly update, etc.")
                            .desired_rows(5)
                            .desired_width(f32::INFINITY),
                    );

                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.label("Select Team to Assign");
                        ComboBox::from_id_salt(format!("team_select_{}", key.id()))
                            .width(180.0)
                            .selected_text(catalog.team(state.team))
                            .show_ui(ui, |ui| {
                                for (i, team) in catalog.teams.iter().enumerate() {
                                    ui.selectable_value(&mut state.team, i, team.as_str());
                                }
                            });
                    });

                    ui.add_space(8.0);
                    ui.columns(2, |cols| {
                        if cols[0].button("Send Action").clicked() {
                            action = PopoverAction::Send;
                        }
                        if cols[1].button("Cancel").clicked() {
                            action = PopoverAction::Cancel;
                        }
                    });
                });

            match action {
                PopoverAction::Send => {
                    session.close(&key);
                    result = BoardAction::Send(key);
                }
                PopoverAction::Cancel => session.close(&key),
                PopoverAction::None => {}
            }
        }

        result
    }

    /// Draw one card. Returns true when "See Details" was clicked.
    fn draw_card(ui: &mut egui::Ui, action: &str, color: &CardColor, key: &PopupKey) -> bool {
        let [fr, fg, fb] = color.start_rgb();
        let [tr, tg, tb] = color.end_rgb();
        let mut clicked = false;

        egui::Frame::none()
            .fill(Color32::from_rgb(fr, fg, fb))
            .stroke(Stroke::new(2.0, Color32::from_rgb(tr, tg, tb)))
            .rounding(12.0)
            .inner_margin(14.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(action).size(15.0).strong().color(Color32::WHITE));
                });
            });

        ui.add_space(4.0);
        if ui
            .push_id(key.id(), |ui| ui.button("See Details"))
            .inner
            .clicked()
        {
            clicked = true;
        }

        clicked
    }

    fn draw_status(ui: &mut egui::Ui, session: &mut SessionState) {
        let Some(status) = session.status() else {
            return;
        };

        let color = match status {
            StatusMessage::Sent(_) => Color32::from_rgb(40, 167, 69),
            StatusMessage::Failed(_) => Color32::from_rgb(220, 53, 69),
        };
        let icon = match status {
            StatusMessage::Sent(_) => "✅",
            StatusMessage::Failed(_) => "⚠",
        };
        let text = format!("{icon} {}", status.text());

        let mut dismiss = false;
        egui::Frame::none()
            .stroke(Stroke::new(1.5, color))
            .rounding(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(text).color(color));
                    if ui.small_button("✖").clicked() {
                        dismiss = true;
                    }
                });
            });

        if dismiss {
            session.take_status();
        }
    }
}
