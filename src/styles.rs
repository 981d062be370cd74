//! The catalog of generation styles.
//!
//! Every style is plain data: a prompt template, the model to call, the image
//! roles it needs and a few presentation fields. One pipeline consumes them all.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Which uploaded photo an input image is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    /// The user's own photo
    Person,
    /// The second photo used by the two-image style
    Celebrity,
}

impl ImageRole {
    /// Key used in metadata records and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Celebrity => "celebrity",
        }
    }

    /// Multipart field names accepted for this role.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Person => &["person", "personImage", "person_image"],
            Self::Celebrity => &["celebrity", "celebrityImage", "celebrity_image"],
        }
    }

    /// Maps a multipart field name back to a role.
    pub fn from_field_name(name: &str) -> Option<Self> {
        [Self::Person, Self::Celebrity]
            .into_iter()
            .find(|role| role.field_names().contains(&name))
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering effort requested from the image API.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// The default
    #[default]
    Medium,
    /// Slower, more detailed
    High,
}

impl Quality {
    /// Values accepted by [`Quality::from_str`].
    pub const ALLOWED: &'static [&'static str] = &["medium", "high"];

    /// Wire value sent to the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "Invalid quality '{other}', allowed values are: {}",
                Self::ALLOWED.join(", ")
            )),
        }
    }
}

/// One entry of the style catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    /// Identifier, also the output file prefix
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Emoji shown on the catalog card
    pub emoji: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Image roles the upload form must supply, in upload order
    pub required_roles: &'static [ImageRole],
    /// Model identifier sent to the API
    pub model: &'static str,
    /// Theme tag recorded in metadata
    pub theme: &'static str,
    /// Heading of the customization suffix appended to the prompt
    #[serde(skip)]
    pub details_label: &'static str,
    /// Base prompt; `{celebrity}` is the only placeholder
    #[serde(skip)]
    pub template: &'static str,
    /// Recorded in metadata when the user left extra details empty
    #[serde(skip)]
    pub default_details: &'static str,
    /// Style-specific metadata fields
    #[serde(skip)]
    pub extras: &'static [(&'static str, &'static str)],
    /// Gallery card title
    pub display_title: &'static str,
    /// Gallery card subtitle when the record has no extra details
    pub display_subtitle: &'static str,
    /// Gallery card type label
    pub display_type: &'static str,
}

impl StyleConfig {
    /// Looks a style up by id.
    pub fn get(id: &str) -> Option<&'static StyleConfig> {
        STYLES.iter().find(|style| style.id == id)
    }

    /// The whole catalog, in display order.
    pub fn all() -> &'static [StyleConfig] {
        STYLES
    }

    /// True when the style needs a second image.
    pub fn has_celebrity(&self) -> bool {
        self.required_roles.contains(&ImageRole::Celebrity)
    }
}

/// Style used for records that carry an unknown style id.
pub const FALLBACK_STYLE_ID: &str = "que-paso-ayer-fiesta";

static STYLES: &[StyleConfig] = &[
    StyleConfig {
        id: "que-paso-ayer-fiesta",
        name: "¿Qué Pasó Ayer?",
        emoji: "🎬",
        description: "Candid paparazzi party shot with a celebrity",
        required_roles: &[ImageRole::Person, ImageRole::Celebrity],
        model: "gpt-image-1",
        theme: "party-paparazzi",
        details_label: "Additional details",
        template: "A candid, photorealistic paparazzi-style photo of me and {celebrity} at a chaotic college house party in a cramped basement. Lots of movement and interaction, the on-camera flash blows out parts of the frame for a messy tabloid feel.",
        default_details: "",
        extras: &[],
        display_title: "Party with a celebrity",
        display_subtitle: "Epic party",
        display_type: "AI Generation",
    },
    StyleConfig {
        id: "chibi-sticker",
        name: "Chibi Sticker Pack",
        emoji: "✨",
        description: "Pack of 9 kawaii stickers",
        required_roles: &[ImageRole::Person],
        model: "gpt-image-1",
        theme: "kawaii",
        details_label: "Additional customization",
        template: "Create a 3x3 grid of nine chibi stickers of the character in the reference image.\n- Plain white background, square 1:1 canvas.\n- Consistent cute cartoon style with vivid colors.\n- Every sticker shows a different pose, expression and mood.\n- Each figure is complete and has an even white sticker outline.\n- No stray elements and no text.",
        default_details: "Default chibi style",
        extras: &[],
        display_title: "Chibi Sticker Pack",
        display_subtitle: "kawaii",
        display_type: "9 Stickers Pack",
    },
    StyleConfig {
        id: "figure-collector",
        name: "Figure Collector",
        emoji: "🏆",
        description: "1/7 scale collectible figure",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "collectible-figure",
        details_label: "Additional customization",
        template: "Turn the character in the image into a realistic 1/7 scale collectible figure standing on a clear round acrylic base on a desk. A monitor behind it shows the figure being sculpted in 3D software and a retail toy box with the artwork sits next to it. Photorealistic lighting, materials and paint work.",
        default_details: "Standard collectible figure",
        extras: &[("scale", "1/7")],
        display_title: "Collectible Figure 1/7",
        display_subtitle: "1/7 scale",
        display_type: "Figure Collector",
    },
    StyleConfig {
        id: "buzz-cut-street",
        name: "Buzz Cut Street",
        emoji: "✂️",
        description: "Fresh buzz cut with a cinematic street look",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "street-style",
        details_label: "Additional details",
        template: "Give the person in the photo a fresh, clean buzz cut while keeping their face recognisable. Place them on a city street at dusk with shallow depth of field, cinematic colour grading and dramatic portrait lighting.",
        default_details: "Standard buzz cut street style",
        extras: &[("style", "Buzz Cut Street")],
        display_title: "Buzz Cut Street Style",
        display_subtitle: "Cinematic street style",
        display_type: "Street Style Transformation",
    },
    StyleConfig {
        id: "film-noir-portrait",
        name: "Film Noir Portrait",
        emoji: "🎬",
        description: "Cinematic film noir portrait in a period interior",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "art-deco-lounge",
        details_label: "Additional historical details",
        template: "Use the uploaded headshot to create a film noir portrait. High-contrast black and white or sepia, hard directional light, deep shadows, film grain and a slight vignette. Period clothing and an ornate vintage interior with wood panels, velvet and brass lamps.",
        default_details: "Standard film noir portrait",
        extras: &[("style", "Film Noir"), ("setting", "Art Deco Lounge")],
        display_title: "Film Noir Portrait",
        display_subtitle: "Art Deco Lounge",
        display_type: "Cinematic Portrait",
    },
    StyleConfig {
        id: "editorial-portrait",
        name: "Editorial Portrait B&W",
        emoji: "📸",
        description: "High resolution black and white editorial portrait",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "black-white-fine-art",
        details_label: "Additional artistic details",
        template: "Create a fine-art editorial portrait of the person in black and white. Soft window light, rich tonal range, visible film grain, clean studio backdrop and a magazine-cover composition.",
        default_details: "Standard editorial portrait with film grain",
        extras: &[("style", "Editorial B&W")],
        display_title: "Editorial Portrait B&W",
        display_subtitle: "Fine Art Photography",
        display_type: "Editorial B&W",
    },
    StyleConfig {
        id: "ghibli-style",
        name: "Ghibli Style",
        emoji: "🌿",
        description: "Hand-drawn anime look in a peaceful landscape",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "studio-ghibli-anime",
        details_label: "Additional scene details",
        template: "Redraw the person as a hand-drawn anime character with soft watercolour shading and warm colours, standing in a calm natural scene such as a meadow, forest clearing or sunset field under big clouds.",
        default_details: "Standard anime transformation",
        extras: &[("style", "Ghibli Style")],
        display_title: "Ghibli Style",
        display_subtitle: "Anime landscape",
        display_type: "Anime Transformation",
    },
    StyleConfig {
        id: "ghibli-classic",
        name: "Ghibli Classic",
        emoji: "🍃",
        description: "Classic anime film still",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "studio-ghibli-anime-classic",
        details_label: "Additional creative details",
        template: "Turn the photo into a still from a classic hand-painted anime film. Keep the composition and the person's features, use painterly backgrounds, gentle light and a nostalgic palette.",
        default_details: "Classic anime style",
        extras: &[("style", "Ghibli Classic")],
        display_title: "Ghibli Classic",
        display_subtitle: "Classic anime still",
        display_type: "Anime Classic",
    },
    StyleConfig {
        id: "lego-collection",
        name: "LEGO Collection",
        emoji: "🧱",
        description: "Minifigure in a collector display case",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "lego-minifigure-display",
        details_label: "Additional details",
        template: "Turn the person into a brick-built minifigure that keeps their hair, clothing colours and accessories, with a small brick-built pet beside it. Show it on a studded baseplate inside a clear glass display case, lit like product photography. No text or logos.",
        default_details: "Standard minifigure display",
        extras: &[("style", "LEGO Collection")],
        display_title: "LEGO Minifigure",
        display_subtitle: "Collector display",
        display_type: "LEGO Collection",
    },
    StyleConfig {
        id: "polaroid-chibi",
        name: "Polaroid Chibi",
        emoji: "📷",
        description: "3D chibi stepping out of a polaroid",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "3d-chibi-polaroid-breakout",
        details_label: "Additional creative details",
        template: "Create a smooth 3D chibi version of the person climbing out of a polaroid photo that shows the original picture. Soft clay-like render, big expressive eyes, the chibi's feet still inside the frame.",
        default_details: "Standard polaroid chibi",
        extras: &[("style", "Polaroid Chibi")],
        display_title: "Polaroid Chibi",
        display_subtitle: "3D breakout",
        display_type: "3D Chibi",
    },
    StyleConfig {
        id: "yarn-doll",
        name: "Yarn Doll Crochet",
        emoji: "🧶",
        description: "Hand-crocheted chibi amigurumi doll",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "hand-crocheted-chibi",
        details_label: "Additional handmade details",
        template: "Make a hand-crocheted amigurumi doll of the person with chibi proportions. Visible yarn stitches, soft pastel wool colours matching their outfit and hair, photographed in a cosy craft setting.",
        default_details: "Standard chibi crochet doll",
        extras: &[("style", "Yarn Doll")],
        display_title: "Yarn Doll Chibi",
        display_subtitle: "Handmade Amigurumi",
        display_type: "Crochet Chibi",
    },
    StyleConfig {
        id: "pencil-sketch",
        name: "Pencil Sketch",
        emoji: "✏️",
        description: "Realistic hand-drawn pencil portrait",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "hand-drawn-realistic",
        details_label: "Additional artistic details",
        template: "Draw the person as a realistic graphite pencil portrait on textured paper. Fine cross-hatching, careful shading of facial features, a few loose construction lines left visible.",
        default_details: "Standard realistic pencil sketch",
        extras: &[("style", "Pencil Sketch")],
        display_title: "Pencil Sketch",
        display_subtitle: "Hand-drawn realism",
        display_type: "Pencil Drawing",
    },
    StyleConfig {
        id: "instagram-chibi",
        name: "Instagram Chibi",
        emoji: "📱",
        description: "3D chibi inside a social media frame",
        required_roles: &[ImageRole::Person],
        model: "nano-banana-oss",
        theme: "3d-chibi-social-media",
        details_label: "Additional creative details",
        template: "Create a cute 3D chibi of the person posing inside a social media post frame, with floating like hearts and emoji around it. Glossy animated-film render quality and bright colours.",
        default_details: "Standard 3D chibi in a social frame",
        extras: &[("style", "Instagram Chibi")],
        display_title: "Instagram Chibi",
        display_subtitle: "Social media frame",
        display_type: "3D Chibi",
    },
];
