//! Scripted generative services for testing.
//!
//! `StubGenerator` implements all three generative ports with fixed answers,
//! counts every call and can hold background removal until the test releases
//! it, which lets a test look at the board while a pipeline is in flight.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::generator_mocks::StubGenerator;
//!
//! let generator = StubGenerator::reacting("steam", vec![1], vec![2]).gated();
//! // ... start a merge, inspect the board ...
//! generator.release();
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use alchemy_domain::{ElementImage, ElementName};

use crate::infrastructure::ports::{
    BackgroundRemovalPort, GenerationError, ImageSynthesisPort, NameProposalPort,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Answer,
    FailSynthesis,
    /// Name proposal never returns
    Stall,
}

pub struct StubGenerator {
    proposal: Option<ElementName>,
    synthesized: ElementImage,
    cleaned: ElementImage,
    behaviour: Behaviour,
    gate: Option<Arc<Semaphore>>,
    proposals: AtomicUsize,
    syntheses: AtomicUsize,
    removals: AtomicUsize,
    references: Mutex<Vec<Vec<ElementImage>>>,
}

impl StubGenerator {
    /// Every pair reacts into `name`, drawn as `synthesized` and cleaned into `cleaned`.
    pub fn reacting(name: &str, synthesized: Vec<u8>, cleaned: Vec<u8>) -> Self {
        Self::build(Some(super::element_name(name)), synthesized, cleaned)
    }

    /// No pair reacts.
    pub fn inert() -> Self {
        Self::build(None, vec![], vec![])
    }

    fn build(proposal: Option<ElementName>, synthesized: Vec<u8>, cleaned: Vec<u8>) -> Self {
        Self {
            proposal,
            synthesized: ElementImage::new(synthesized),
            cleaned: ElementImage::new(cleaned),
            behaviour: Behaviour::Answer,
            gate: None,
            proposals: AtomicUsize::new(0),
            syntheses: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
            references: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.behaviour = Behaviour::FailSynthesis;
        self
    }

    pub fn stalled(mut self) -> Self {
        self.behaviour = Behaviour::Stall;
        self
    }

    /// Hold background removal until `release` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let one held background removal through. Releases add up.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn proposal_calls(&self) -> usize {
        self.proposals.load(Ordering::SeqCst)
    }

    pub fn synthesis_calls(&self) -> usize {
        self.syntheses.load(Ordering::SeqCst)
    }

    pub fn removal_calls(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.proposal_calls() + self.synthesis_calls() + self.removal_calls()
    }

    /// Reference images of every synthesis request, in call order.
    pub fn references(&self) -> Vec<Vec<ElementImage>> {
        self.references
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NameProposalPort for StubGenerator {
    async fn propose_name(
        &self,
        _first: &ElementName,
        _second: &ElementName,
    ) -> Result<Option<ElementName>, GenerationError> {
        self.proposals.fetch_add(1, Ordering::SeqCst);
        if self.behaviour == Behaviour::Stall {
            std::future::pending::<()>().await;
        }
        Ok(self.proposal.clone())
    }
}

#[async_trait]
impl ImageSynthesisPort for StubGenerator {
    async fn synthesize_image(
        &self,
        _name: &ElementName,
        references: &[ElementImage],
    ) -> Result<ElementImage, GenerationError> {
        self.syntheses.fetch_add(1, Ordering::SeqCst);
        self.references
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(references.to_vec());
        if self.behaviour == Behaviour::FailSynthesis {
            return Err(GenerationError::RequestFailed("HTTP 500: upstream".into()));
        }
        Ok(self.synthesized.clone())
    }
}

#[async_trait]
impl BackgroundRemovalPort for StubGenerator {
    async fn remove_background(
        &self,
        _image: &ElementImage,
    ) -> Result<ElementImage, GenerationError> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        Ok(self.cleaned.clone())
    }
}
