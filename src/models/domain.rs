use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Analyzed design brief produced by the proposal generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(rename = "designDirection", default)]
    pub design_direction: Option<String>,
    #[serde(rename = "targetCustomer", default)]
    pub target_customer: Option<String>,
    #[serde(rename = "requiredDesigns", default)]
    pub required_designs: Option<String>,
}

impl Proposal {
    pub fn new(
        design_direction: impl Into<String>,
        target_customer: impl Into<String>,
        required_designs: impl Into<String>,
    ) -> Self {
        Self {
            design_direction: Some(design_direction.into()),
            target_customer: Some(target_customer.into()),
            required_designs: Some(required_designs.into()),
        }
    }

    /// The three free-text fields in extraction order
    pub fn fields(&self) -> [Option<&str>; 3] {
        [
            self.design_direction.as_deref(),
            self.target_customer.as_deref(),
            self.required_designs.as_deref(),
        ]
    }
}

/// Returned when a vocabulary token is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken(pub String);

impl fmt::Display for UnknownToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vocabulary token: {}", self.0)
    }
}

impl std::error::Error for UnknownToken {}

/// Design categories a designer can specialise in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignCategory {
    Logo,
    Brand,
    Goods,
    PosterFlyer,
    BannerAd,
    Package,
    Card,
}

impl DesignCategory {
    pub const ALL: [DesignCategory; 7] = [
        DesignCategory::Logo,
        DesignCategory::Brand,
        DesignCategory::Goods,
        DesignCategory::PosterFlyer,
        DesignCategory::BannerAd,
        DesignCategory::Package,
        DesignCategory::Card,
    ];

    pub fn token(self) -> &'static str {
        match self {
            DesignCategory::Logo => "LOGO",
            DesignCategory::Brand => "BRAND",
            DesignCategory::Goods => "GOODS",
            DesignCategory::PosterFlyer => "POSTER_FLYER",
            DesignCategory::BannerAd => "BANNER_AD",
            DesignCategory::Package => "PACKAGE",
            DesignCategory::Card => "CARD",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DesignCategory::Logo => "로고 디자인",
            DesignCategory::Brand => "브랜드 디자인",
            DesignCategory::Goods => "굿즈 디자인",
            DesignCategory::PosterFlyer => "포스터/전단지 디자인",
            DesignCategory::BannerAd => "배너/광고 디자인",
            DesignCategory::Package => "패키지 디자인",
            DesignCategory::Card => "명함/카드/인쇄물 디자인",
        }
    }
}

impl FromStr for DesignCategory {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DesignCategory::ALL
            .into_iter()
            .find(|category| category.token().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

/// Visual styles a designer works in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignStyle {
    Minimal,
    Modern,
    Classic,
    Vintage,
    Illustration,
    Typography,
}

impl DesignStyle {
    pub const ALL: [DesignStyle; 6] = [
        DesignStyle::Minimal,
        DesignStyle::Modern,
        DesignStyle::Classic,
        DesignStyle::Vintage,
        DesignStyle::Illustration,
        DesignStyle::Typography,
    ];

    pub fn token(self) -> &'static str {
        match self {
            DesignStyle::Minimal => "MINIMAL",
            DesignStyle::Modern => "MODERN",
            DesignStyle::Classic => "CLASSIC",
            DesignStyle::Vintage => "VINTAGE",
            DesignStyle::Illustration => "ILLUSTRATION",
            DesignStyle::Typography => "TYPOGRAPHY",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DesignStyle::Minimal => "미니멀",
            DesignStyle::Modern => "모던",
            DesignStyle::Classic => "클래식",
            DesignStyle::Vintage => "빈티지",
            DesignStyle::Illustration => "일러스트",
            DesignStyle::Typography => "타이포그래피",
        }
    }
}

impl FromStr for DesignStyle {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DesignStyle::ALL
            .into_iter()
            .find(|style| style.token().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

/// Image attached to a portfolio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioImage {
    pub id: i64,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageName", default)]
    pub image_name: Option<String>,
    #[serde(rename = "isThumbnail", default)]
    pub is_thumbnail: bool,
}

/// A designer's portfolio entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "designCategories", default)]
    pub categories: Vec<DesignCategory>,
    #[serde(default)]
    pub images: Vec<PortfolioImage>,
}

/// Designer record returned by a candidate source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignerCandidate {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub nickname: String,
    #[serde(rename = "selectedSpecialities", default)]
    pub categories: Vec<DesignCategory>,
    #[serde(rename = "selectedDesignStyles", default)]
    pub styles: Vec<DesignStyle>,
    #[serde(default)]
    pub portfolios: Vec<Portfolio>,
    #[serde(rename = "profileImageUrl", default)]
    pub profile_image_url: Option<String>,
}

impl DesignerCandidate {
    /// Category descriptions joined in selection order
    pub fn specialty(&self) -> String {
        self.categories
            .iter()
            .map(|category| category.description())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Up to `limit` portfolio images, thumbnails first
    pub fn preview_images(&self, limit: usize) -> Vec<PortfolioImage> {
        let all = self.portfolios.iter().flat_map(|portfolio| portfolio.images.iter());

        let mut picked: Vec<PortfolioImage> = all
            .clone()
            .filter(|image| image.is_thumbnail)
            .take(limit)
            .cloned()
            .collect();

        if picked.len() < limit {
            let missing = limit - picked.len();
            picked.extend(all.filter(|image| !image.is_thumbnail).take(missing).cloned());
        }

        picked
    }
}

/// Designer summary shown to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedDesigner {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub nickname: String,
    pub specialty: String,
    #[serde(rename = "profileImageUrl")]
    pub profile_image_url: Option<String>,
    #[serde(rename = "portfolioImageUrl")]
    pub portfolio_images: Vec<PortfolioImage>,
}

impl From<&DesignerCandidate> for RecommendedDesigner {
    fn from(candidate: &DesignerCandidate) -> Self {
        Self {
            user_id: candidate.user_id,
            nickname: candidate.nickname.clone(),
            specialty: candidate.specialty(),
            profile_image_url: candidate.profile_image_url.clone(),
            portfolio_images: candidate.preview_images(2),
        }
    }
}

/// Scored designer result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredDesigner {
    pub designer: RecommendedDesigner,
    #[serde(rename = "matchingScore")]
    pub matching_score: u32,
    #[serde(rename = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
}

impl ScoredDesigner {
    pub fn user_id(&self) -> i64 {
        self.designer.user_id
    }
}

/// Per-rule weights for keyword scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub category: u32,
    pub style: u32,
    pub portfolio: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 2,
            style: 3,
            portfolio: 1,
        }
    }
}
