use crate::ranking::view::{RankingView, TaskView};
use anyhow::{Context, Result};
use minijinja::{context, Environment};

/// Pages of the ranking server. The templates are compiled into the binary.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("ranking.html", include_str!("../../templates/ranking.html"))
            .context("Template ranking.html is invalid")?;
        env.add_template(
            "task_details.html",
            include_str!("../../templates/task_details.html"),
        )
        .context("Template task_details.html is invalid")?;
        Ok(Self { env })
    }

    pub fn render_ranking(
        &self,
        view: &RankingView,
        languages: &[&str],
    ) -> Result<String, minijinja::Error> {
        self.env
            .get_template("ranking.html")?
            .render(context! { view => view, languages => languages })
    }

    pub fn render_task(&self, view: &RankingView, task: &TaskView) -> Result<String, minijinja::Error> {
        self.env
            .get_template("task_details.html")?
            .render(context! {
                view => view,
                task => task,
                has_statement => task.statement.is_some(),
            })
    }
}
