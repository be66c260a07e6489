use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 指向可选 TOML 配置文件的环境变量
pub const CONFIG_FILE_ENV: &str = "QUIZ_CONFIG_FILE";

/// 程序配置
///
/// 优先级：环境变量 > TOML 配置文件 > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 共享密钥，请求中的 secret 必须与之相等
    pub my_secret: String,
    // --- LLM 配置 ---
    /// 为空时真实题目只能得到错误答案
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    // --- 浏览器配置 ---
    pub headless: bool,
    pub chrome_executable: Option<String>,
    /// 等待 #result 出现的最长秒数
    pub render_wait_secs: u64,
    // --- 服务配置 ---
    pub bind_addr: String,
    /// 每个来源 60 秒内允许的请求数，0 表示不限流
    pub rate_limit_max: usize,
    // --- 时间预算 ---
    pub max_time_secs: u64,
    pub retry_margin_secs: u64,
    pub chain_margin_secs: u64,
    pub fetch_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    // --- 提交 ---
    pub max_payload_bytes: usize,
    pub default_submit_url: String,
    pub demo_answer: i64,
    /// 是否下载题目中的 PDF 作为解题提示
    pub fetch_documents: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            my_secret: "MYTDSLLM2025".to_string(),
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_tokens: 500,
            headless: true,
            chrome_executable: None,
            render_wait_secs: 10,
            bind_addr: "0.0.0.0:5000".to_string(),
            rate_limit_max: 10,
            max_time_secs: 170,
            retry_margin_secs: 40,
            chain_margin_secs: 25,
            fetch_timeout_secs: 10,
            submit_timeout_secs: 15,
            max_payload_bytes: 900_000,
            default_submit_url: "https://tds-llm-analysis.s-anand.net/submit".to_string(),
            demo_answer: 12345,
            fetch_documents: false,
        }
    }
}

impl Config {
    /// 加载 `.env`、可选 TOML 文件，再叠加环境变量
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                Ok(Self::from_toml_file(&path)?.with_env_overrides())
            }
            _ => Ok(Self::from_env()),
        }
    }

    /// 默认值叠加环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            my_secret: env_string("MY_SECRET").unwrap_or(base.my_secret),
            llm_api_key: env_string("OPENAI_API_KEY").or(base.llm_api_key),
            llm_api_base_url: env_string("OPENAI_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            llm_max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(base.llm_max_tokens),
            headless: env_flag("HEADLESS").unwrap_or(base.headless),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(base.chrome_executable),
            render_wait_secs: env_parse("RENDER_WAIT_SECS").unwrap_or(base.render_wait_secs),
            bind_addr: env_string("BIND_ADDR").unwrap_or(base.bind_addr),
            rate_limit_max: env_parse("RATE_LIMIT_MAX").unwrap_or(base.rate_limit_max),
            max_time_secs: env_parse("MAX_TIME_SECS").unwrap_or(base.max_time_secs),
            retry_margin_secs: env_parse("RETRY_MARGIN_SECS").unwrap_or(base.retry_margin_secs),
            chain_margin_secs: env_parse("CHAIN_MARGIN_SECS").unwrap_or(base.chain_margin_secs),
            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS").unwrap_or(base.fetch_timeout_secs),
            submit_timeout_secs: env_parse("SUBMIT_TIMEOUT_SECS").unwrap_or(base.submit_timeout_secs),
            max_payload_bytes: env_parse("MAX_PAYLOAD_BYTES").unwrap_or(base.max_payload_bytes),
            default_submit_url: env_string("DEFAULT_SUBMIT_URL").unwrap_or(base.default_submit_url),
            demo_answer: env_parse("DEMO_ANSWER").unwrap_or(base.demo_answer),
            fetch_documents: env_flag("FETCH_DOCUMENTS").unwrap_or(base.fetch_documents),
        }
    }

    pub fn max_time(&self) -> Duration {
        Duration::from_secs(self.max_time_secs)
    }

    pub fn retry_margin(&self) -> Duration {
        Duration::from_secs(self.retry_margin_secs)
    }

    pub fn chain_margin(&self) -> Duration {
        Duration::from_secs(self.chain_margin_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn render_wait(&self) -> Duration {
        Duration::from_secs(self.render_wait_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

/// 只有 "true"（不区分大小写）算开启，其余值均为关闭
fn env_flag(name: &str) -> Option<bool> {
    env_string(name).map(|v| v.eq_ignore_ascii_case("true"))
}
