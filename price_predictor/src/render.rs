use car_model::{metrics::group_thousands, FeatureVector};
use minijinja::{context, Environment};

/// Compiled page templates. Auto-escaping is on for `.html` names.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_filter("thousands", group_thousands);
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        env.add_template("result.html", include_str!("../templates/result.html"))?;
        Ok(Self { env })
    }

    pub fn index(&self) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {})
    }

    pub fn result(&self, pred_price: i64, details: &FeatureVector) -> Result<String, minijinja::Error> {
        self.env
            .get_template("result.html")?
            .render(context! { pred_price, details })
    }
}
