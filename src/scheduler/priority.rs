//! Resource prioritization for optimal loading
//!
//! Priority hints assigned per resource type, adjusted by `fetchpriority`
//! importance hints and async/defer script attributes. The resulting
//! [`Priority`] is what callers hand to the scheduler when registering a
//! request.

/// Resource type for prioritization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Main HTML document
    Document,
    /// CSS stylesheet (render blocking)
    Stylesheet,
    /// JavaScript (potentially blocking)
    Script,
    /// Web font
    Font,
    /// Image
    Image,
    /// Video
    Video,
    /// Audio
    Audio,
    /// XMLHttpRequest/Fetch
    Xhr,
    /// Other resources
    Other,
}

impl ResourceType {
    /// Get default priority for resource type
    pub fn default_priority(&self) -> Priority {
        match self {
            Self::Document => Priority::VeryHigh,
            Self::Stylesheet => Priority::VeryHigh,
            Self::Font => Priority::High,
            Self::Script => Priority::High,
            Self::Xhr => Priority::High,
            Self::Image => Priority::Low,
            Self::Video => Priority::VeryLow,
            Self::Audio => Priority::VeryLow,
            Self::Other => Priority::Low,
        }
    }

    /// Check if this resource is render blocking
    pub fn is_render_blocking(&self) -> bool {
        matches!(self, Self::Document | Self::Stylesheet)
    }

    /// Parse resource type from content-type header
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_lowercase();

        if ct.contains("html") {
            Self::Document
        } else if ct.contains("css") {
            Self::Stylesheet
        } else if ct.contains("javascript") || ct.contains("ecmascript") {
            Self::Script
        } else if ct.contains("font") || ct.contains("woff") || ct.contains("ttf") {
            Self::Font
        } else if ct.contains("image") {
            Self::Image
        } else if ct.contains("video") {
            Self::Video
        } else if ct.contains("audio") {
            Self::Audio
        } else {
            Self::Other
        }
    }

    /// Parse from URL extension
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();

        if lower.ends_with(".html") || lower.ends_with(".htm") {
            Self::Document
        } else if lower.ends_with(".css") {
            Self::Stylesheet
        } else if lower.ends_with(".js") || lower.ends_with(".mjs") {
            Self::Script
        } else if lower.ends_with(".woff2") || lower.ends_with(".woff") ||
                  lower.ends_with(".ttf") || lower.ends_with(".otf") {
            Self::Font
        } else if lower.ends_with(".png") || lower.ends_with(".jpg") ||
                  lower.ends_with(".jpeg") || lower.ends_with(".gif") ||
                  lower.ends_with(".webp") || lower.ends_with(".svg") {
            Self::Image
        } else if lower.ends_with(".mp4") || lower.ends_with(".webm") {
            Self::Video
        } else if lower.ends_with(".mp3") || lower.ends_with(".ogg") {
            Self::Audio
        } else {
            Self::Other
        }
    }
}

/// Resource priority levels (similar to Chrome's)
///
/// Lower discriminant = more urgent. `VeryHigh` requests bypass the
/// scheduler's limits entirely; `Low` and below are delayable and subject
/// to the body-insertion gate and the global delayable cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Highest priority (main document)
    VeryHigh = 0,
    /// High priority (CSS, fonts)
    High = 1,
    /// Medium priority (sync scripts)
    Medium = 2,
    /// Low priority (images)
    Low = 3,
    /// Very low (video, audio)
    VeryLow = 4,
    /// Idle (prefetch)
    Idle = 5,
}

impl Priority {
    /// Whether requests at this priority may be held back by the scheduler
    pub fn is_delayable(self) -> bool {
        self >= Priority::Low
    }

    /// Whether requests at this priority skip admission checks entirely
    ///
    /// Correctness of render-blocking loads must never depend on
    /// scheduler state.
    pub fn bypasses_limits(self) -> bool {
        self == Priority::VeryHigh
    }

    pub(crate) fn index(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_index(index: u8) -> Priority {
        match index {
            0 => Priority::VeryHigh,
            1 => Priority::High,
            2 => Priority::Medium,
            3 => Priority::Low,
            4 => Priority::VeryLow,
            _ => Priority::Idle,
        }
    }
}

/// Importance hint from fetchpriority attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceHint {
    High,
    Low,
    Auto,
}

/// Compute the final priority for a resource
///
/// Starts from the type's default, applies the importance hint, then
/// demotes async/defer script loads which are off the critical path.
pub fn compute_priority(
    resource_type: ResourceType,
    hint: Option<ImportanceHint>,
    is_async_or_deferred: bool,
) -> Priority {
    let base = resource_type.default_priority();

    let with_hint = match hint {
        Some(ImportanceHint::High) => match base {
            Priority::Low | Priority::VeryLow => Priority::Medium,
            Priority::Medium => Priority::High,
            p => p,
        },
        Some(ImportanceHint::Low) => match base {
            Priority::High | Priority::VeryHigh => Priority::Medium,
            Priority::Medium => Priority::Low,
            p => p,
        },
        _ => base,
    };

    if is_async_or_deferred {
        match with_hint {
            Priority::VeryHigh => Priority::High,
            Priority::High => Priority::Medium,
            p => p,
        }
    } else {
        with_hint
    }
}
