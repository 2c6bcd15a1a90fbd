//! Plain-language condition summary and advisories for a loaded table.
//!
//! The records are rendered as a short text block, wrapped in a prompt whose
//! shape depends on how many use cases the user typed, and sent to the first
//! chat backend that answers. The reply is split back into a summary plus one
//! advisory per section. When no backend answers, canned sample text is
//! returned with a notice so the caller still has something to show.

pub mod backend;

use tracing::{debug, info, warn};

use crate::{error::InsightsError, model::WeatherRecord, units::UnitLabels};

pub use backend::{BackendKind, ChatBackend, LlmBackend, backends_from_env};

const SAMPLE_CITIES: [&str; 3] = ["New York", "Los Angeles", "Chicago"];

const SUMMARY_SECTION: &str = "**Condition summary:** Brief overview of conditions across the \
    cities (e.g., mild vs cold, clear vs cloudy, wind). 2–4 sentences.";

const SAMPLE_SUMMARY: &str = "Conditions vary across the selected cities: cooler and windier \
    in the north, milder and calmer in the south. Expect a mix of clear and partly cloudy skies.";

const SAMPLE_TRAINING: &str = "• Good conditions for outdoor runs in LA; light layers.\n\
    • In Chicago, allow extra time for wind and cooler temps; consider a headwind leg first.\n\
    • In New York, partly cloudy and mild, suitable for most outdoor training.";

const SAMPLE_TRAVEL: &str = "• Layer up in colder cities (e.g., Chicago); light jacket or long \
    sleeves for milder ones.\n\
    • Pack for a range of temps if traveling between cities.\n\
    • Windier in the north, allow buffer for travel time.";

pub const NO_BACKEND_NOTICE: &str = "No AI provider available. Showing sample output. To get \
    real insights: set OPENAI_API_KEY, or run Ollama locally (ollama run llama3.2), \
    or set OLLAMA_API_KEY for Ollama cloud.";

pub const TRAINING_TITLE: &str = "Training advisory";
pub const TRAVEL_TITLE: &str = "Travel advisory";

/// One titled block of advice, e.g. "Advisory for running".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub title: String,
    pub body: String,
}

impl Advisory {
    fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into() }
    }

    fn for_use_case(use_case: &str, body: impl Into<String>) -> Self {
        Self::new(format!("Advisory for {use_case}"), body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    pub summary: String,
    /// Training + travel with no use case, otherwise one per use case in input order.
    pub advisories: Vec<Advisory>,
    /// Unparsed model reply. `None` for sample output.
    pub raw: Option<String>,
    pub sample: bool,
    /// Set when the output is a fallback the user should know about.
    pub notice: Option<String>,
}

/// Runs the backend chain in order and keeps the first non-blank reply.
#[derive(Debug)]
pub struct Advisor {
    backends: Vec<Box<dyn ChatBackend>>,
}

impl Advisor {
    pub fn new(backends: Vec<Box<dyn ChatBackend>>) -> Self {
        Self { backends }
    }

    /// OpenAI, then local Ollama, then Ollama cloud, keyed from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(backends_from_env()?))
    }

    pub async fn advise(
        &self,
        records: &[WeatherRecord],
        units: &UnitLabels,
        use_case: &str,
    ) -> Result<Insights, InsightsError> {
        if records.is_empty() {
            return Err(InsightsError::NoData);
        }

        let use_cases = parse_use_cases(use_case);
        let cities = city_list(records);
        let prompt = build_prompt(&weather_to_text(records, units), &use_cases, &cities);
        debug!(use_cases = use_cases.len(), cities = cities.len(), "Built insights prompt");

        for backend in &self.backends {
            match backend.complete(&prompt).await {
                Ok(reply) if !reply.trim().is_empty() => {
                    info!(backend = backend.name(), "Received insights");
                    return Ok(parse_sections(&reply, &use_cases));
                }
                Ok(_) => warn!(backend = backend.name(), "Backend returned an empty reply"),
                Err(e) => warn!(backend = backend.name(), "Backend unavailable: {e:#}"),
            }
        }

        warn!("No insights backend answered, using sample output");
        let mut insights = sample_insights(&use_cases, &cities);
        insights.notice = Some(NO_BACKEND_NOTICE.to_string());
        Ok(insights)
    }
}

/// One line per record: `  City: 42°F, Partly cloudy, humidity 65%, wind 12 mph`.
pub fn weather_to_text(records: &[WeatherRecord], units: &UnitLabels) -> String {
    if records.is_empty() {
        return "No city data.".to_string();
    }

    records
        .iter()
        .map(|r| {
            let description = if r.description.is_empty() { "—" } else { &r.description };
            format!(
                "  {}: {}{}, {}, humidity {}%, wind {} {}",
                r.location,
                r.temperature,
                units.temperature_label,
                description,
                r.humidity,
                r.wind_speed,
                units.speed_label
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-separated use cases, trimmed, blanks dropped.
pub fn parse_use_cases(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|u| !u.is_empty()).map(str::to_string).collect()
}

/// Distinct locations in row order.
pub fn city_list(records: &[WeatherRecord]) -> Vec<String> {
    let mut cities: Vec<String> = Vec::with_capacity(records.len());
    for record in records {
        if !cities.contains(&record.location) {
            cities.push(record.location.clone());
        }
    }
    cities
}

pub fn build_prompt(weather_text: &str, use_cases: &[String], cities: &[String]) -> String {
    let cities_phrase =
        if cities.is_empty() { "the cities in the data".to_string() } else { cities.join(", ") };
    let by_city = format!(
        "Organize your advice by city: for each of {cities_phrase}, give a subheading with \
         the city name followed by a colon (e.g. \"New York:\" on its own line), \
         then 1–3 bullet points"
    );
    let header = format!("Current weather for selected cities:\n\n{weather_text}\n\n");

    match use_cases {
        [] => format!(
            "{header}Respond in exactly three short sections. No other intro or outro.\n\n\
             {SUMMARY_SECTION}\n\n\
             **Training advisory:** Practical tips for outdoor training (e.g., running, cycling). \
             {by_city}. Do not use markdown bold for city names. Use bullet points.\n\n\
             **Travel advisory:** Practical tips for travel (e.g., packing, driving, layering). \
             {by_city}. Do not use markdown bold for city names. Use bullet points."
        ),
        [use_case] => format!(
            "{header}The user's use case: {use_case}\n\n\
             Respond in exactly two short sections. No other intro or outro.\n\n\
             {SUMMARY_SECTION}\n\n\
             **Advisory for {use_case}:** Evaluate the weather specifically for this use case. \
             {by_city} with practical tips. Do not use markdown bold for city names. \
             Use bullet points."
        ),
        many => {
            let sections: Vec<String> =
                many.iter().map(|u| format!("- **Advisory for {u}:**")).collect();
            format!(
                "{header}The user's use cases: {}\n\n\
                 Respond with the following sections. No other intro or outro.\n\n\
                 {SUMMARY_SECTION}\n\n\
                 For each use case below, provide a section with that exact header. Within each \
                 section, organize advice by city: for each of {cities_phrase}, give a subheading \
                 with the city name followed by a colon (e.g. \"New York:\" on its own line), \
                 then 1–3 bullet points. Do not use markdown bold for city names.\n\n{}",
                many.join(", "),
                sections.join("\n")
            )
        }
    }
}

/// Split a model reply into summary and advisories, matching the prompt shape
/// that was sent for `use_cases`.
pub fn parse_sections(raw: &str, use_cases: &[String]) -> Insights {
    let text = raw.trim();
    let (summary, advisories) = match use_cases {
        [] => split_training_travel(text),
        [use_case] => split_single_advisory(text, use_case),
        many => split_per_use_case(text, many),
    };

    Insights { summary, advisories, raw: Some(raw.to_string()), sample: false, notice: None }
}

/// Canned output in the same shape a real reply would have.
pub fn sample_insights(use_cases: &[String], cities: &[String]) -> Insights {
    let cities: Vec<&str> = if cities.is_empty() {
        SAMPLE_CITIES.to_vec()
    } else {
        cities.iter().map(String::as_str).collect()
    };
    let by_city = |use_case: &str| {
        cities
            .iter()
            .map(|c| format!("{c}:\n• Sample advice for {use_case} here."))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let advisories = if use_cases.is_empty() {
        vec![
            Advisory::new(TRAINING_TITLE, SAMPLE_TRAINING),
            Advisory::new(TRAVEL_TITLE, SAMPLE_TRAVEL),
        ]
    } else {
        use_cases.iter().map(|u| Advisory::for_use_case(u, by_city(u.as_str()))).collect()
    };

    Insights {
        summary: SAMPLE_SUMMARY.to_string(),
        advisories,
        raw: None,
        sample: true,
        notice: None,
    }
}

// Offsets found in the ASCII-lowercased copy are valid in the original text.
fn ascii_lower(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Drop the first `**...` header line of a block.
fn strip_header(block: &str) -> String {
    match block.lines().find(|line| line.trim().starts_with("**")) {
        Some(line) => block.replacen(line, "", 1).trim().to_string(),
        None => block.trim().to_string(),
    }
}

fn first_paragraph(text: &str) -> (&str, &str) {
    match text.split_once("\n\n") {
        Some((first, rest)) => (first.trim(), rest.trim()),
        None => (text.trim(), ""),
    }
}

fn find_marker(lower: &str, needles: &[&str], at_start: &str) -> Option<usize> {
    needles
        .iter()
        .find_map(|n| lower.find(n))
        .or_else(|| lower.starts_with(at_start).then_some(0))
}

fn split_training_travel(text: &str) -> (String, Vec<Advisory>) {
    let lower = ascii_lower(text);
    let training = find_marker(
        &lower,
        &["**training advisory", "**training", "\ntraining advisory"],
        "training advisory",
    );
    let travel = find_marker(
        &lower,
        &["**travel advisory", "**travel", "\ntravel advisory"],
        "travel advisory",
    );

    let (summary, training, travel) = match (training, travel) {
        (Some(tr), Some(tv)) => {
            let (training, travel) = if tr < tv {
                (&text[tr..tv], &text[tv..])
            } else {
                (&text[tr..], &text[tv..tr])
            };
            (strip_header(&text[..tr.min(tv)]), strip_header(training), strip_header(travel))
        }
        _ => {
            let (first, rest) = first_paragraph(text);
            (strip_header(first), rest.to_string(), String::new())
        }
    };

    (summary, vec![Advisory::new(TRAINING_TITLE, training), Advisory::new(TRAVEL_TITLE, travel)])
}

fn split_single_advisory(text: &str, use_case: &str) -> (String, Vec<Advisory>) {
    let lower = ascii_lower(text);
    let (summary, advisory) =
        match lower.find("**advisory for").or_else(|| lower.find("**advisory")) {
            Some(i) => (strip_header(&text[..i]), strip_header(&text[i..])),
            None => {
                let (first, rest) = first_paragraph(text);
                (strip_header(first), strip_header(rest))
            }
        };

    (summary, vec![Advisory::for_use_case(use_case, advisory)])
}

fn split_per_use_case(text: &str, use_cases: &[String]) -> (String, Vec<Advisory>) {
    const MARKER: &str = "**advisory for";

    let first = ascii_lower(text).find(MARKER).unwrap_or(text.len());
    let summary = strip_header(&text[..first]);
    let rest = text[first..].trim();
    let rest_lower = ascii_lower(rest);

    let mut pos = 0;
    let mut advisories = Vec::with_capacity(use_cases.len());
    for use_case in use_cases {
        let marker = format!("{MARKER} {}", use_case.to_ascii_lowercase());
        let Some(start) = rest_lower[pos..].find(&marker).map(|i| i + pos) else {
            advisories.push(Advisory::for_use_case(use_case, ""));
            continue;
        };

        let after = start + marker.len();
        let end = rest_lower[after..].find(MARKER).map_or(rest.len(), |i| i + after);
        advisories.push(Advisory::for_use_case(use_case, strip_header(&rest[start..end])));
        pos = end;
    }

    (summary, advisories)
}
