//! Built-in speaker catalog and speaker-id resolution.

use serde::Serialize;

use crate::error::{TtsError, TtsResult};

/// Speaker used when a request names none.
pub const DEFAULT_SPEAKER: &str = "ono_anna";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeakerInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub native_lang: &'static str,
}

/// The voices shipped with the CustomVoice model, in display order.
pub static SPEAKERS: [SpeakerInfo; 9] = [
    SpeakerInfo {
        id: "Ono_Anna",
        label: "Ono_Anna (日本語女性)",
        description: "明るく軽やかな日本語女性の声。遊び心があり、機敏な印象。",
        native_lang: "Japanese",
    },
    SpeakerInfo {
        id: "Sohee",
        label: "Sohee (韓国語女性)",
        description: "温かみのある韓国語女性の声。豊かな感情表現。",
        native_lang: "Korean",
    },
    SpeakerInfo {
        id: "Vivian",
        label: "Vivian (中国語女性)",
        description: "明るく、やや鋭い若い女性の声。",
        native_lang: "Chinese",
    },
    SpeakerInfo {
        id: "Serena",
        label: "Serena (中国語女性)",
        description: "温かく優しい若い女性の声。",
        native_lang: "Chinese",
    },
    SpeakerInfo {
        id: "Ryan",
        label: "Ryan (英語男性)",
        description: "ダイナミックな男性の声。リズム感が強い。",
        native_lang: "English",
    },
    SpeakerInfo {
        id: "Aiden",
        label: "Aiden (英語男性)",
        description: "明るいアメリカ英語の男性の声。クリアな中音域。",
        native_lang: "English",
    },
    SpeakerInfo {
        id: "Dylan",
        label: "Dylan (中国語・北京方言男性)",
        description: "若々しい北京方言の男性の声。クリアで自然な音色。",
        native_lang: "Chinese (Beijing)",
    },
    SpeakerInfo {
        id: "Eric",
        label: "Eric (中国語・四川方言男性)",
        description: "活発な成都方言の男性の声。やや掠れた明るさ。",
        native_lang: "Chinese (Sichuan)",
    },
    SpeakerInfo {
        id: "Uncle_Fu",
        label: "Uncle_Fu (中国語男性)",
        description: "経験豊富な男性の声。低く、まろやかな音色。",
        native_lang: "Chinese",
    },
];

/// Catalog ids, used whenever a model does not report its own speakers.
pub fn default_speaker_ids() -> Vec<String> {
    SPEAKERS.iter().map(|s| s.id.to_string()).collect()
}

/// Match `requested` against the speakers a model reports, ignoring case.
///
/// Models may report ids in a different case than the catalog, so the
/// model's own spelling is returned.
pub fn resolve_speaker(requested: &str, available: &[String]) -> TtsResult<String> {
    let wanted = requested.to_lowercase();
    available
        .iter()
        .find(|s| s.to_lowercase() == wanted)
        .cloned()
        .ok_or_else(|| TtsError::UnknownSpeaker {
            requested: requested.to_string(),
            available: available.to_vec(),
        })
}
