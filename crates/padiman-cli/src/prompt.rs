//! Terminal prompter: asks settlement questions on stdout, reads stdin.

use async_trait::async_trait;
use padiman_core::Naira;
use padiman_core::domain::{Decision, DecisionRequest};
use padiman_core::ports::Prompter;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

pub struct StdinPrompter {
    input: Mutex<BufReader<Stdin>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn ask(&self, question: &str) -> Option<String> {
        let mut out = tokio::io::stdout();
        out.write_all(format!("{question}\n> ").as_bytes()).await.ok()?;
        out.flush().await.ok()?;

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await.ok()?;
        (read > 0).then(|| line.trim().to_string())
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn decide(&self, request: &DecisionRequest) -> Decision {
        let hint = match request {
            DecisionRequest::ConfirmFindersFee { .. } => "[y/N]",
            DecisionRequest::Deposit { .. } => "[y = deposit shortfall / amount / N]",
        };
        let Some(answer) = self.ask(&format!("{} {hint}", request.prompt())).await else {
            return Decision::Decline;
        };
        parse_answer(request, &answer)
    }
}

fn parse_answer(request: &DecisionRequest, answer: &str) -> Decision {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Decision::Confirm,
        other => match (request, other.replace(',', "").parse::<u64>()) {
            (DecisionRequest::Deposit { .. }, Ok(amount)) if amount > 0 => {
                Decision::Deposit(Naira::new(amount))
            }
            _ => Decision::Decline,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padiman_core::domain::FundingPurpose;

    fn deposit_request() -> DecisionRequest {
        DecisionRequest::Deposit {
            purpose: FundingPurpose::Escrow,
            required: Naira::new(625),
            available: Naira::ZERO,
            shortfall: Naira::new(625),
        }
    }

    #[test]
    fn answers_are_parsed() {
        let req = deposit_request();
        assert_eq!(parse_answer(&req, "Y"), Decision::Confirm);
        assert_eq!(parse_answer(&req, "1,000"), Decision::Deposit(Naira::new(1_000)));
        assert_eq!(parse_answer(&req, ""), Decision::Decline);
        assert_eq!(parse_answer(&req, "0"), Decision::Decline);
    }
}
