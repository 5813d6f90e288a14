use clap::Args;
use deskrhythm_core::scoring::{assess_ratio, health_score, score_to_points};

#[derive(Args)]
pub struct ScoreArgs {
    /// Sitting minutes
    pub sitting: u32,
    /// Standing minutes
    pub standing: u32,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ScoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let score = health_score(args.sitting, args.standing);
    let tier = score_to_points(score.score);
    let ratio = assess_ratio(args.sitting, args.standing);

    if args.json {
        let out = serde_json::json!({
            "health_score": score.score,
            "ratio_score": score.ratio_score,
            "duration_score": score.duration_score,
            "points": tier.points,
            "feedback": tier.feedback,
            "ratio": ratio.ratio,
            "healthy": ratio.healthy,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Health score: {}/100 (ratio {:.2}, duration {:.2})",
            score.score, score.ratio_score, score.duration_score
        );
        println!("Points: {}", tier.points);
        println!("{}", tier.feedback);
        println!("{}", ratio.recommendation);
    }
    Ok(())
}
