use crate::ranking::contest::ContestState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Immutable standings of a contest at one point in time. A refresh builds a new view instead
/// of editing the current one.
#[derive(Clone, Debug, Serialize)]
pub struct RankingView {
    pub contest_name: String,
    pub tasks: Vec<TaskView>,
    pub rows: Vec<RankingRow>,
    /// Zero for the placeholder published before the first refresh.
    pub generation: u64,
    pub last_refreshed: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskView {
    pub name: String,
    pub title: String,
    pub max_score: f64,
    #[serde(skip)]
    pub statement: Option<String>,
    pub stats: TaskStats,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskStats {
    /// Participants with a score on this task.
    pub scored: usize,
    pub full_score: usize,
    pub best: Option<f64>,
    pub average: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub username: String,
    /// One cell per task, in the order of [`RankingView::tasks`].
    pub scores: Vec<Option<f64>>,
    pub total: f64,
}

impl RankingView {
    pub fn empty() -> Self {
        Self {
            contest_name: String::new(),
            tasks: Vec::new(),
            rows: Vec::new(),
            generation: 0,
            last_refreshed: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Aggregates standings in O(participants × tasks). Scores for unknown tasks and
    /// non-finite scores are ignored.
    pub fn build(state: ContestState, generation: u64, last_refreshed: DateTime<Utc>) -> Self {
        let task_index: HashMap<&str, usize> = state
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.name.as_str(), i))
            .collect();

        let mut rows: Vec<RankingRow> = state
            .participants
            .iter()
            .map(|participant| {
                let mut scores = vec![None; state.tasks.len()];
                for (task, &score) in &participant.scores {
                    if let Some(&i) = task_index.get(task.as_str()) {
                        if score.is_finite() {
                            scores[i] = Some(score);
                        }
                    }
                }
                RankingRow {
                    rank: 0,
                    username: participant.username.clone(),
                    total: scores.iter().flatten().sum(),
                    scores,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.username.cmp(&b.username))
        });

        // Equal totals share a rank: 1, 1, 3
        for i in 0..rows.len() {
            rows[i].rank = if i > 0 && rows[i].total == rows[i - 1].total {
                rows[i - 1].rank
            } else {
                i + 1
            };
        }

        let tasks = state
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, task)| {
                let stats = task_stats(rows.iter().filter_map(|row| row.scores[i]), task.max_score);
                TaskView {
                    title: if task.title.is_empty() {
                        task.name.clone()
                    } else {
                        task.title
                    },
                    name: task.name,
                    max_score: task.max_score,
                    statement: task.statement,
                    stats,
                }
            })
            .collect();

        Self {
            contest_name: state.name,
            tasks,
            rows,
            generation,
            last_refreshed,
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskView> {
        self.tasks.iter().find(|task| task.name == name)
    }
}

fn task_stats(scores: impl Iterator<Item = f64>, max_score: f64) -> TaskStats {
    let mut stats = TaskStats::default();
    let mut sum = 0.0;
    for score in scores {
        stats.scored += 1;
        sum += score;
        if max_score > 0.0 && score >= max_score {
            stats.full_score += 1;
        }
        stats.best = Some(stats.best.map_or(score, |best: f64| best.max(score)));
    }
    if stats.scored > 0 {
        stats.average = Some(sum / stats.scored as f64);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::contest::{ParticipantScores, TaskInfo};

    fn task(name: &str) -> TaskInfo {
        TaskInfo {
            name: name.to_string(),
            title: String::new(),
            max_score: 100.0,
            statement: None,
        }
    }

    fn participant(username: &str, scores: &[(&str, f64)]) -> ParticipantScores {
        ParticipantScores {
            username: username.to_string(),
            scores: scores.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
        }
    }

    #[test]
    fn ranks_by_total_with_shared_places() {
        let state = ContestState {
            name: "round".to_string(),
            tasks: vec![task("a"), task("b")],
            participants: vec![
                participant("carol", &[("a", 50.0)]),
                participant("bob", &[("a", 100.0), ("b", 20.0)]),
                participant("alice", &[("b", 120.0)]),
                participant("dave", &[]),
            ],
        };
        let view = RankingView::build(state, 1, Utc::now());

        let order: Vec<(usize, &str)> = view
            .rows
            .iter()
            .map(|row| (row.rank, row.username.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "alice"), (1, "bob"), (3, "carol"), (4, "dave")]);
        assert_eq!(view.rows[1].scores, vec![Some(100.0), Some(20.0)]);
        assert_eq!(view.rows[0].scores, vec![None, Some(120.0)]);
        assert_eq!(view.rows[3].total, 0.0);
    }

    #[test]
    fn ignores_unknown_tasks_and_bad_scores() {
        let state = ContestState {
            name: "round".to_string(),
            tasks: vec![task("a")],
            participants: vec![participant("eve", &[("zzz", 1000.0), ("a", f64::NAN)])],
        };
        let view = RankingView::build(state, 1, Utc::now());
        assert_eq!(view.rows[0].scores, vec![None]);
        assert_eq!(view.rows[0].total, 0.0);
    }

    #[test]
    fn computes_task_stats() {
        let state = ContestState {
            name: "round".to_string(),
            tasks: vec![task("a"), task("b")],
            participants: vec![
                participant("x", &[("a", 100.0)]),
                participant("y", &[("a", 40.0)]),
                participant("z", &[]),
            ],
        };
        let view = RankingView::build(state, 1, Utc::now());
        let a = view.task("a").unwrap();
        assert_eq!(a.title, "a");
        assert_eq!(
            a.stats,
            TaskStats {
                scored: 2,
                full_score: 1,
                best: Some(100.0),
                average: Some(70.0),
            }
        );
        assert_eq!(view.task("b").unwrap().stats, TaskStats::default());
        assert!(view.task("c").is_none());
    }
}
