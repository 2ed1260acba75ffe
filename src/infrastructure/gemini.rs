//! Gemini-backed implementation of the strategy generation port.
//!
//! Thin transport: build a prompt, request JSON-mode output, hand the parsed
//! payload to domain validation. Everything the model returns is treated as
//! an opaque, trusted-shape artifact; no retries (a failed call surfaces to
//! the user, who may re-trigger the action).

use crate::domain::errors::StrategyError;
use crate::domain::ports::StrategyGenerator;
use crate::domain::types::{BacktestInput, BacktestRecord, Preferences, ScriptVersion, Strategy};
use crate::domain::validation;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiStrategyService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiStrategyService {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn generate_json(
        &self,
        prompt: String,
        temperature: f64,
    ) -> Result<serde_json::Value, StrategyError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StrategyError::service(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StrategyError::service(format!(
                "model API returned status {}",
                response.status()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| StrategyError::service(format!("unreadable response body: {e}")))?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StrategyError::service("empty model response"))?;

        serde_json::from_str(text).map_err(|e| {
            StrategyError::validation(format!("response text is not valid JSON: {e}"))
        })
    }
}

#[async_trait]
impl StrategyGenerator for GeminiStrategyService {
    async fn generate(&self, preferences: &Preferences) -> Result<Strategy, StrategyError> {
        info!(
            "Requesting strategy generation ({} / {} / {})",
            preferences.trading_style, preferences.market, preferences.risk_tolerance
        );
        let payload = self
            .generate_json(generation_prompt(preferences), 0.8)
            .await?;
        validation::strategy_from_value(payload)
    }

    async fn optimize(&self, source: &Strategy) -> Result<Strategy, StrategyError> {
        info!("Requesting optimization of '{}'", source.strategy_name);
        let payload = self.generate_json(optimization_prompt(source), 0.7).await?;
        validation::strategy_from_value(payload)
    }

    async fn run_backtest(
        &self,
        pine_script: &str,
        version: ScriptVersion,
        input: &BacktestInput,
    ) -> Result<BacktestRecord, StrategyError> {
        info!(
            "Requesting backtest of {} on {}",
            input.asset, input.timeframe
        );
        let payload = self
            .generate_json(backtest_prompt(pine_script, version, input), 0.5)
            .await?;
        validation::backtest_from_value(payload)
    }
}

fn generation_prompt(preferences: &Preferences) -> String {
    format!(
        "Act as an expert quantitative analyst and trading strategy developer. \
         Design a novel, effective trading strategy for these user preferences:\n\
         - Trading Style: {style}\n\
         - Market: {market}\n\
         - Risk Tolerance: {risk}\n\
         - Desired Pine Script Version: {version}\n\
         - Initial Capital (for context): ${capital}\n\n\
         Requirements:\n\
         1. In 'generationRationale', explain why this design fits the preferences.\n\
         2. Define entry/exit signals, indicators with settings, and risk management \
            rules matching the {risk} risk profile.\n\
         3. Provide a 'logicBreakdown' array of 3 to 6 sequential steps, each with a \
            'type' ('condition', 'action', 'entry' or 'exit') and a 'description'.\n\
         4. Provide complete, syntactically correct Pine Script {version} in 'pineScript'.\n\
         5. Provide plausible hypothetical figures in 'backtestHighlights' (netProfit, \
            totalTrades, winRate, profitFactor, maxDrawdown) and a 'confidenceScore' \
            between 0.0 and 1.0.\n\
         6. Include 'strategyName', 'description', 'tradingStyle', 'market', \
            'riskTolerance', 'pineScriptVersion' and a 'parameters' object.\n\
         Return a single JSON object with exactly those fields and no markdown fences.",
        style = preferences.trading_style,
        market = preferences.market,
        risk = preferences.risk_tolerance,
        version = preferences.pine_script_version,
        capital = preferences.capital,
    )
}

fn optimization_prompt(source: &Strategy) -> String {
    let parameters = serde_json::to_string(&source.parameters).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Act as an expert quantitative analyst. Analyze and optimize this existing \
         trading strategy:\n\
         - Name: {name}\n\
         - Trading Style: {style}\n\
         - Market: {market}\n\
         - Risk Tolerance: {risk}\n\
         - Pine Script Version: {version}\n\
         - Description: {description}\n\
         - Parameters: {parameters}\n\n\
         Pine Script:\n{script}\n\n\
         Identify weaknesses (lagging indicators, false signals, weak risk management) \
         and implement concrete improvements. In 'generationRationale' explain exactly \
         what you changed and why. Give the result a name marking it as an optimized \
         version, e.g. \"{name} v2\". Return a complete strategy as a single JSON \
         object with the same fields as a generated strategy (strategyName, \
         description, generationRationale, tradingStyle, market, riskTolerance, \
         pineScriptVersion, parameters, pineScript, confidenceScore, \
         backtestHighlights, logicBreakdown) and no markdown fences.",
        name = source.strategy_name,
        style = source.trading_style,
        market = source.market,
        risk = source.risk_tolerance,
        version = source.pine_script_version,
        description = source.description,
        parameters = parameters,
        script = source.pine_script,
    )
}

fn backtest_prompt(pine_script: &str, version: ScriptVersion, input: &BacktestInput) -> String {
    let period = match (&input.start_date, &input.end_date) {
        (Some(start), Some(end)) => {
            format!("The backtest must be strictly performed between {start} and {end}.")
        }
        _ => "Use a recent, relevant period for this timeframe (e.g. the last three \
              months for daily bars)."
            .to_string(),
    };
    format!(
        "Act as a backtesting engine for TradingView Pine Script strategies. \
         Perform a realistic hypothetical backtest of the following Pine Script \
         {version} strategy.\n\
         - Asset/Ticker: {asset}\n\
         - Timeframe: {timeframe}\n\
         - Backtest Period: {period}\n\n\
         Strategy script:\n{script}\n\n\
         Produce a single JSON object with:\n\
         1. 'input': the asset, timeframe and dates used.\n\
         2. 'chartData': 150-200 OHLC points ('time', 'open', 'high', 'low', 'close') \
            with chronologically sorted 'YYYY-MM-DD' or RFC3339 timestamps.\n\
         3. 'trades': executed trades ('time', 'type' of 'buy' or 'sell', 'price') \
            from simulating the script on that data with standard commissions and \
            slippage.\n\
         4. 'metrics': netProfit, totalTrades, winRate, profitFactor, maxDrawdown.\n\
         5. 'analysis': strengths, weaknesses and one concrete suggestion.\n\
         6. 'updatedPineScript': the script rewritten to hardcode this asset, \
            timeframe and date range so it replicates the run on TradingView.\n\
         No markdown fences.",
        version = version,
        asset = input.asset,
        timeframe = input.timeframe,
        period = period,
        script = pine_script,
    )
}
