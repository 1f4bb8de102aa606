use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 脚本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    General,
    Exploit,
    Aimbot,
    Autofarm,
    Speed,
    Gui,
}

impl ScriptType {
    pub const ALL: [ScriptType; 6] = [
        ScriptType::General,
        ScriptType::Exploit,
        ScriptType::Aimbot,
        ScriptType::Autofarm,
        ScriptType::Speed,
        ScriptType::Gui,
    ];

    /// 线上传输使用的取值
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptType::General => "general",
            ScriptType::Exploit => "exploit",
            ScriptType::Aimbot => "aimbot",
            ScriptType::Autofarm => "autofarm",
            ScriptType::Speed => "speed",
            ScriptType::Gui => "gui",
        }
    }

    /// 界面显示名称
    pub fn label(self) -> &'static str {
        match self {
            ScriptType::General => "General",
            ScriptType::Exploit => "Exploit/Hack",
            ScriptType::Aimbot => "Aimbot/ESP",
            ScriptType::Autofarm => "Auto-Farm",
            ScriptType::Speed => "Speed/Teleport",
            ScriptType::Gui => "Custom GUI",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

/// 复杂度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Easy, Complexity::Medium, Complexity::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Easy => "easy",
            Complexity::Medium => "medium",
            Complexity::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Complexity::Easy => "Easy",
            Complexity::Medium => "Medium",
            Complexity::Hard => "Hard",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(pos + step) % all.len()]
}

/// 用户等级，目前只有免费档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    #[default]
    Free,
}

/// 生成请求（每次提交时重新构造）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub script_type: ScriptType,
    pub complexity: Complexity,
    pub user_tier: UserTier,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, script_type: ScriptType, complexity: Complexity) -> Self {
        Self {
            prompt: prompt.into(),
            script_type,
            complexity,
            user_tier: UserTier::Free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub code: String,
}

/// 生成元数据
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct GenerationMetadata {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    /// 秒
    #[serde(default)]
    pub generation_time: f64,
    #[serde(default)]
    pub cost_estimate: f64,
    #[serde(default)]
    pub fallback_used: bool,
}

/// 最近一次成功的生成结果
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub script: Script,
    pub metadata: GenerationMetadata,
    pub received_at: DateTime<Local>,
}

impl GenerationResult {
    pub fn new(script: Script, metadata: GenerationMetadata) -> Self {
        Self {
            script,
            metadata,
            received_at: Local::now(),
        }
    }

    pub fn code(&self) -> &str {
        &self.script.code
    }
}

/// 服务端对生成请求的答复
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    Success(GenerationResult),
    /// `success: false`，携带服务端给出的错误（可能缺失）
    Failure(Option<String>),
}

/// 提供商状态，未知取值原样保留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderStatus {
    Available,
    Unavailable,
    Other(String),
}

impl ProviderStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ProviderStatus::Available)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderStatus::Available => "available",
            ProviderStatus::Unavailable => "unavailable",
            ProviderStatus::Other(s) => s,
        }
    }
}

impl From<String> for ProviderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "available" => ProviderStatus::Available,
            "unavailable" => ProviderStatus::Unavailable,
            _ => ProviderStatus::Other(value),
        }
    }
}

impl From<ProviderStatus> for String {
    fn from(value: ProviderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI 提供商
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub status: ProviderStatus,
    #[serde(default)]
    pub models: Vec<String>,
}

/// 脚本模板
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ScriptType,
    pub complexity: Complexity,
}

impl Template {
    /// 由模板名称和描述合成提示词
    pub fn synthesized_prompt(&self) -> String {
        format!(
            "Create a {} - {}",
            self.name.to_lowercase(),
            self.description
        )
    }
}
