use serde::{Deserialize, Serialize};

use crate::core::{PlanInputs, PlanOutcome};

const GENERATE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.0-flash";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug)]
pub struct AdvisorClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AdvisorClient {
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(format!(
                "AI analysis is not configured; set the {API_KEY_ENV} environment variable"
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: MODEL.to_string(),
        })
    }

    pub async fn financial_health_check(
        &self,
        inputs: &PlanInputs,
        outcome: &PlanOutcome,
    ) -> Result<String, String> {
        let url = format!(
            "{GENERATE_BASE_URL}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(inputs, outcome),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("AI request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("AI API error: {}", response.status()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid AI response: {e}"))?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();
        if text.is_empty() {
            return Err("Received an empty response from the AI. Please try again.".to_string());
        }
        Ok(text)
    }
}

pub fn build_prompt(inputs: &PlanInputs, outcome: &PlanOutcome) -> String {
    format!(
        "You are a friendly and experienced financial advisor in India. Your goal is to \
         provide a clear, helpful, and encouraging analysis of a user's retirement plan. Do \
         not provide any financial advice that could be construed as professional investment \
         advice. Frame all suggestions as educational and for informational purposes only, \
         and add a disclaimer at the end. Based on the following data, please provide a \
         \"Financial Health Check\":\n\
         **User's Financial Data:**\n\
         * Current Portfolio Value: {current}\n\
         * Monthly SIP: {sip}\n\
         * Remaining SIP Tenure: {sip_months} months\n\
         * Projected Retirement Corpus: {corpus}\n\
         * Desired Retirement Period (SWP): {swp_years} years\n\
         * Initial Monthly Withdrawal (SWP): {withdrawal}\n\
         **Assumptions:**\n\
         * Expected Annual Market Return: {return_pct:.1}%\n\
         * Expected Annual Inflation: {inflation_pct:.1}%.\n\
         **Your Analysis Should Include:**\n\
         1. **Overall Outlook:** Start with a brief, encouraging summary. Is the plan on \
         track, ambitious, or cautious?\n\
         2. **Potential Strengths:** What are the strong points of this plan? (e.g., high \
         savings rate, long investment horizon).\n\
         3. **Potential Risks & Blind Spots:** What should the user be mindful of? (e.g., \
         sequence of returns risk, underestimating inflation, healthcare costs). Be specific.\n\
         4. **Actionable Suggestions:** Provide 2-3 clear, actionable tips.\n\
         5. **Lifestyle Snapshot:** Based on the initial monthly withdrawal of {withdrawal}, \
         provide a sample monthly budget for a comfortable lifestyle in a major Indian metro \
         city like Bangalore or Pune. Use categories like Housing, Food, Utilities, \
         Transport, Healthcare, and Leisure.\n\
         Please format your response using Markdown for clarity (headings, bold text, and \
         lists).",
        current = format_inr(inputs.current_market_value),
        sip = format_inr(inputs.monthly_sip),
        sip_months = inputs.sip_tenure_months,
        corpus = format_inr(outcome.projected_corpus),
        swp_years = inputs.swp_tenure_years,
        withdrawal = format_inr(outcome.initial_monthly_withdrawal),
        return_pct = inputs.market_return_rate * 100.0,
        inflation_pct = inputs.inflation_rate * 100.0,
    )
}

// Indian-style digit grouping: last three digits, then groups of two.
pub fn format_inr(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut reversed = String::with_capacity(digits.len() + digits.len() / 2);
    for (index, ch) in digits.chars().rev().enumerate() {
        if index == 3 || (index > 3 && (index - 3) % 2 == 0) {
            reversed.push(',');
        }
        reversed.push(ch);
    }
    let grouped: String = reversed.chars().rev().collect();
    let sign = if value.round() < 0.0 { "-" } else { "" };
    format!("{sign}\u{20b9}{grouped}")
}
