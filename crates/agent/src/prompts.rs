//! User-facing prompts and their rendering

use intake_bot_core::{Choice, Localizer, Reply, UserChoice};

/// Messages the dialogue sends, each backed by a catalog key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Greeting,
    UnsupportedLocale,
    AskCategory,
    AskWholesaleSubtype,
    AskRetailSubtype,
    DescribeProject,
    CemeteryQuestion,
    DescribeMonument,
    DescribeItem,
    FilesSavedSendPhone,
    AskFileComment,
    CommentSavedSendPhone,
    AddMoreDetails,
    UnsupportedContent,
    InvalidPhone,
    ContactButtonOnly,
    ThankYou,
    ErrorSavingData,
    ErrorOccurred,
    Cancelled,
    PressStart,
}

impl Prompt {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::UnsupportedLocale => "unsupported_locale",
            Self::AskCategory => "ask_category",
            Self::AskWholesaleSubtype => "ask_wholesale_subtype",
            Self::AskRetailSubtype => "ask_retail_subtype",
            Self::DescribeProject => "describe_project",
            Self::CemeteryQuestion => "cemetery_question",
            Self::DescribeMonument => "describe_monument",
            Self::DescribeItem => "describe_item",
            Self::FilesSavedSendPhone => "files_saved_send_phone",
            Self::AskFileComment => "ask_file_comment",
            Self::CommentSavedSendPhone => "comment_saved_send_phone",
            Self::AddMoreDetails => "add_more_details",
            Self::UnsupportedContent => "unsupported_content",
            Self::InvalidPhone => "invalid_phone",
            Self::ContactButtonOnly => "contact_button_only",
            Self::ThankYou => "thank_you",
            Self::ErrorSavingData => "error_saving_data",
            Self::ErrorOccurred => "error_occurred",
            Self::Cancelled => "cancelled",
            Self::PressStart => "press_start",
        }
    }
}

/// Substitute `{name}` style placeholders
pub(crate) fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// Builds replies in one locale
pub struct PromptRenderer<'a> {
    localizer: &'a dyn Localizer,
    locale: &'a str,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(localizer: &'a dyn Localizer, locale: &'a str) -> Self {
        Self { localizer, locale }
    }

    pub fn locale(&self) -> &str {
        self.locale
    }

    /// Raw catalog text for any key
    pub fn key(&self, key: &str) -> String {
        self.localizer.text(self.locale, key)
    }

    pub fn text(&self, prompt: Prompt) -> String {
        self.key(prompt.key())
    }

    pub fn text_with(&self, prompt: Prompt, vars: &[(&str, &str)]) -> String {
        fill(&self.text(prompt), vars)
    }

    pub fn reply(&self, prompt: Prompt) -> Reply {
        Reply::text(self.text(prompt))
    }

    /// Prompt with one inline button per choice
    pub fn with_choices(&self, text: String, choices: &[UserChoice]) -> Reply {
        let buttons = choices
            .iter()
            .map(|choice| Choice::new(self.key(choice.label_key()), choice.payload()))
            .collect();
        Reply::with_choices(text, buttons)
    }

    /// Prompt with the share-contact button
    pub fn contact_request(&self, prompt: Prompt) -> Reply {
        Reply::with_contact_request(self.text(prompt), self.key("btn_share_contact"))
    }

    pub fn removing_keyboard(&self, prompt: Prompt) -> Reply {
        Reply::removing_keyboard(self.text(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_bot_core::{Category, Keyboard};

    struct Catalog;

    impl Localizer for Catalog {
        fn text(&self, locale: &str, key: &str) -> String {
            format!("{}:{}", locale, key)
        }

        fn base_locale(&self) -> &str {
            "en"
        }

        fn supports(&self, locale: &str) -> bool {
            locale == "en"
        }
    }

    #[test]
    fn test_fill_placeholders() {
        assert_eq!(fill("Hi {name}, {name}!", &[("name", "Ivan")]), "Hi Ivan, Ivan!");
        assert_eq!(fill("{url}", &[]), "{url}");
    }

    #[test]
    fn test_choice_buttons_use_labels_and_payloads() {
        let renderer = PromptRenderer::new(&Catalog, "ru");
        let reply = renderer.with_choices(
            renderer.text(Prompt::AskCategory),
            &[
                UserChoice::Category(Category::Wholesale),
                UserChoice::Category(Category::Retail),
            ],
        );
        assert_eq!(reply.text, "ru:ask_category");
        let choices = reply.choices();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].label, "ru:btn_wholesale");
        assert_eq!(choices[1].payload, "category:retail");
    }

    #[test]
    fn test_contact_request() {
        let renderer = PromptRenderer::new(&Catalog, "pl");
        let reply = renderer.contact_request(Prompt::InvalidPhone);
        assert_eq!(
            reply.keyboard,
            Keyboard::RequestContact {
                label: "pl:btn_share_contact".into()
            }
        );
    }
}
