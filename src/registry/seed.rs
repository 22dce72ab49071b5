//! Built-in free-tier catalog loaded at startup when no catalog file is configured

use crate::provider::ProviderKind;
use crate::registry::catalog::Catalog;
use crate::registry::model::{ModelDescriptor, ModelLimits};

fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn text(
    id: &str,
    name: &str,
    provider: &str,
    backend: ProviderKind,
    backend_model: Option<&str>,
    max_tokens: u32,
    languages: &[&str],
    capabilities: &[&str],
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        backend,
        backend_model: backend_model.map(String::from),
        limits: ModelLimits::Text { max_tokens },
        cost_per_unit: 0.0,
        languages: set(languages),
        capabilities: set(capabilities),
        is_local: backend.is_local(),
        is_available: true,
    }
}

fn image(id: &str, name: &str, engine: &str, styles: &[&str]) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        provider: "Stability AI".to_string(),
        backend: ProviderKind::Stability,
        backend_model: Some(engine.to_string()),
        limits: ModelLimits::Image {
            resolution: "1024x1024".to_string(),
        },
        cost_per_unit: 0.0,
        languages: Default::default(),
        capabilities: set(styles),
        is_local: false,
        is_available: true,
    }
}

fn video(id: &str, name: &str, provider: &str, max_duration_seconds: u32) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        backend: ProviderKind::LocalVideo,
        backend_model: None,
        limits: ModelLimits::Video { max_duration_seconds },
        cost_per_unit: 0.0,
        languages: Default::default(),
        capabilities: Default::default(),
        is_local: true,
        is_available: true,
    }
}

/// Free models for every capability, each bound to the client that serves it
pub fn seed_catalog() -> Catalog {
    Catalog {
        text: vec![
            text(
                "gemini-2.0-flash",
                "Gemini 2.0 Flash",
                "Google",
                ProviderKind::Gemini,
                None,
                8192,
                &["en", "ar", "fr", "es", "de"],
                &["text_generation", "translation", "summarization", "question_answering"],
            ),
            text(
                "llama-3.2-3b",
                "Llama 3.2 3B",
                "Meta (via Ollama)",
                ProviderKind::Ollama,
                Some("llama3.2:3b"),
                4096,
                &["en", "ar", "es"],
                &["text_generation", "summarization", "code_generation"],
            ),
            text(
                "mistral-7b",
                "Mistral 7B",
                "Mistral AI",
                ProviderKind::Ollama,
                Some("mistral:7b"),
                32768,
                &["en", "fr", "es", "de", "it"],
                &["text_generation", "translation", "summarization"],
            ),
            text(
                "qwen2.5-7b",
                "Qwen 2.5 7B",
                "Alibaba",
                ProviderKind::Ollama,
                Some("qwen2.5:7b"),
                32768,
                &["en", "zh", "ar", "fr", "es"],
                &["text_generation", "translation", "code_generation", "reasoning"],
            ),
            text(
                "phi-3-mini",
                "Phi-3 Mini",
                "Microsoft",
                ProviderKind::Ollama,
                Some("phi3:mini"),
                4096,
                &["en", "es", "fr", "de"],
                &["text_generation", "summarization", "instruction_following"],
            ),
            text(
                "mistral-7b-instruct",
                "Mistral 7B Instruct (Hugging Face)",
                "Mistral AI",
                ProviderKind::HuggingFace,
                Some("mistralai/Mistral-7B-Instruct-v0.2"),
                8192,
                &["en", "fr", "es", "de", "it"],
                &["text_generation", "instruction_following"],
            ),
            text(
                "qwen2.5-7b-instruct",
                "Qwen 2.5 7B Instruct (Hugging Face)",
                "Alibaba",
                ProviderKind::HuggingFace,
                Some("Qwen/Qwen2.5-7B-Instruct"),
                32768,
                &["en", "zh", "ar", "fr", "es"],
                &["text_generation", "translation", "code_generation", "reasoning"],
            ),
            text(
                "flan-t5-xl",
                "FLAN-T5 XL",
                "Google",
                ProviderKind::HuggingFace,
                Some("google/flan-t5-xl"),
                512,
                &["en"],
                &["text_generation", "question_answering", "summarization"],
            ),
        ],
        image: vec![
            image(
                "stable-diffusion-xl",
                "Stable Diffusion XL",
                "stable-diffusion-xl-1024-v1-0",
                &["realistic", "anime", "digital-art", "photographic"],
            ),
            image(
                "stable-diffusion-v1-6",
                "Stable Diffusion 1.6",
                "stable-diffusion-v1-6",
                &["realistic", "digital-art", "illustration"],
            ),
        ],
        video: vec![
            video("stable-video-diffusion", "Stable Video Diffusion", "Stability AI", 4),
            video("modelscope-t2v", "ModelScope T2V", "Alibaba", 3),
            video("zeroscope-v2", "Zeroscope v2", "Community", 3),
        ],
    }
}
