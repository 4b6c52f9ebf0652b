use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct LabelEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> LabelEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Collecting orders...");
        let orders = self.pipeline.extract().await?;
        let resolved = orders
            .iter()
            .filter(|o| !o.tracking_number.is_empty())
            .count();
        tracing::info!(
            "Collected {} orders ({} with a tracking number)",
            orders.len(),
            resolved
        );

        tracing::info!("Rendering labels...");
        let batch = self.pipeline.transform(orders).await?;
        let rendered = batch.labels.iter().filter(|l| l.svg.is_some()).count();
        tracing::info!("Rendered {} of {} labels", rendered, batch.labels.len());

        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(batch).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
