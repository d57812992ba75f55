//! Note model rendering: field lists, card templates and styling.

use crate::flashcards::{fit_values, CardSides, TemplateSpec};

/// Name of the single card template every generated note model carries
pub const CARD_TEMPLATE_NAME: &str = "Dynamic template";

pub const CARD_CSS: &str = r#".card {
  font-family: 'Arial';
  font-size: 20px;
  color: #2c3e50;
  background-color: #ecf0f1;
  text-align: center;
  padding: 20px;
}
hr#answer {
  margin-top: 25px;
  border: 1px solid #bdc3c7;
}
.my-question {
  font-weight: bold;
  color: #2980b9;
}
.my-answer {
  font-style: italic;
}
.my-hint {
  font-size: 16px;
  color: #7f8c8d;
  margin-top: 10px;
  font-style: italic;
}
"#;

/// Question side: every front field in its own block inside the card div
pub fn question_template(front: &[String]) -> String {
    let mut qfmt = String::from("<div class=\"card\">\n");
    for field in front {
        qfmt.push_str(&format!("  <div class=\"my-question\">{{{{{}}}}}</div>\n", field));
    }
    qfmt.push_str("</div>");
    qfmt
}

/// Answer side: the question, a divider, then every back field
pub fn answer_template(back: &[String]) -> String {
    let mut afmt = String::from("{{FrontSide}}<hr id=\"answer\">\n");
    for field in back {
        afmt.push_str(&format!("  <div class=\"my-answer\">{{{{{}}}}}</div>\n", field));
    }
    afmt
}

/// A note type derived from a template's field lists
#[derive(Debug, Clone, PartialEq)]
pub struct NoteModel {
    pub id: i64,
    pub name: String,
    /// Front field names followed by back field names
    pub fields: Vec<String>,
    pub front_count: usize,
    pub back_count: usize,
    pub qfmt: String,
    pub afmt: String,
    pub css: String,
}

impl NoteModel {
    pub fn from_template(template: &TemplateSpec) -> Self {
        Self {
            id: template.template_id,
            name: template.template_name.clone(),
            fields: template.field_names(),
            front_count: template.front.len(),
            back_count: template.back.len(),
            qfmt: question_template(&template.front),
            afmt: answer_template(&template.back),
            css: CARD_CSS.to_string(),
        }
    }

    /// Values for one note, in field order, padded or truncated per side
    pub fn note_values(&self, sides: CardSides) -> Vec<String> {
        let mut values = fit_values(sides.front, self.front_count);
        values.extend(fit_values(sides.back, self.back_count));
        values
    }
}
