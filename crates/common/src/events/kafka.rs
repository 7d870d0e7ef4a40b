//! Kafka publisher for tenant lifecycle events.
//!
//! Messages are keyed by tenant id, carry `event-type`, `tenant-id` and
//! `correlation-id` headers, and are produced with wait-for-all-replicas
//! acks, snappy compression and bounded send retries (at-least-once).

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, error, info};

use super::{EventPublisher, LifecycleEvent};
use crate::config::KafkaConfig;
use crate::errors::{Error, Result};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.broker_list().join(","))
            .set("client.id", &config.client_id)
            .set("acks", &config.acks)
            .set("compression.type", &config.compression)
            .set("message.send.max.retries", config.max_retry.to_string())
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| Error::Configuration(format!("kafka producer: {e}")))?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic_tenant_lifecycle,
            acks = %config.acks,
            "Kafka producer initialized"
        );

        Ok(Self {
            producer,
            topic: config.topic_tenant_lifecycle.clone(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, event: LifecycleEvent) -> Result<()> {
        let payload = serde_json::to_vec(&event)?;
        let event_type = event.event_type.as_str();

        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event-type",
                value: Some(event_type),
            })
            .insert(Header {
                key: "tenant-id",
                value: Some(event.tenant_id.as_str()),
            })
            .insert(Header {
                key: "correlation-id",
                value: Some(event.correlation_id.as_str()),
            });

        let record = FutureRecord::to(&self.topic)
            .key(event.tenant_id.as_str())
            .payload(&payload)
            .headers(headers);

        match self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await {
            Ok((partition, offset)) => {
                debug!(
                    event_type,
                    tenant_id = %event.tenant_id,
                    correlation_id = %event.correlation_id,
                    partition,
                    offset,
                    "Event published"
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!(
                    event_type,
                    tenant_id = %event.tenant_id,
                    error = %e,
                    "Failed to publish event"
                );
                Err(Error::Publish(e.to_string()))
            }
        }
    }

    async fn close(&self) {
        info!("Flushing Kafka producer");
        if let Err(e) = self.producer.flush(Timeout::After(FLUSH_TIMEOUT)) {
            error!(error = %e, "Kafka producer flush failed, events may be lost");
        }
    }
}
