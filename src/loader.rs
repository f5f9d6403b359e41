//! Background fetching.
//!
//! Each request runs on its own worker thread and reports back over a
//! channel.  Only the newest contributions request is ever applied, and a
//! day detail is only applied while its date is still the one being shown.
//! At most one fetch per day detail, and per period, is in flight at a time.
use crate::calendar::{DateRange, Period};
use crate::contrib::Sample;
use crate::source::{detail_or_zeroed, DataSource, DayDetail, FetchError};
use std::collections::HashSet;
use std::io;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use time::Date;

/// What a worker thread sends back
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Completion {
    Contributions {
        generation: u64,
        period: Period,
        range: DateRange,
        result: Result<Vec<Sample>, FetchError>,
    },
    Detail {
        date: Date,
        detail: DayDetail,
    },
}

/// A completion that is still relevant and should be applied
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Update {
    Contributions {
        period: Period,
        range: DateRange,
        result: Result<Vec<Sample>, FetchError>,
    },
    Detail {
        date: Date,
        detail: DayDetail,
    },
}

/// Generation bookkeeping for "last started wins"
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Supersession {
    issued: u64,
    applied: u64,
}

impl Supersession {
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Make every generation issued so far stale without starting a new one
    pub(crate) fn abandon(&mut self) {
        self.issued += 1;
        self.applied = self.issued;
    }

    /// Returns `true` if `generation` is the newest one issued, marking it
    /// applied
    pub(crate) fn accept(&mut self, generation: u64) -> bool {
        if generation == self.issued {
            self.applied = generation;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.applied != self.issued
    }
}

#[derive(Debug)]
pub(crate) struct Loader {
    source: Arc<dyn DataSource>,
    subject: String,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    generations: Supersession,
    /// What the newest contributions request is for
    latest: Option<(Period, DateRange)>,
    details_in_flight: HashSet<Date>,
}

impl Loader {
    pub(crate) fn new(source: Arc<dyn DataSource>, subject: String) -> Loader {
        let (tx, rx) = channel();
        Loader {
            source,
            subject,
            tx,
            rx,
            generations: Supersession::default(),
            latest: None,
            details_in_flight: HashSet::new(),
        }
    }

    pub(crate) fn subject(&self) -> &str {
        &self.subject
    }

    /// Whether the newest contributions request has yet to be applied
    pub(crate) fn is_loading(&self) -> bool {
        self.generations.is_pending()
    }

    /// Start fetching contributions for `period`, superseding any request
    /// already in flight.  If the newest request is for the same dates and
    /// has not finished yet, it is left to run and no new one is started.
    pub(crate) fn request_contributions(
        &mut self,
        period: Period,
        range: DateRange,
    ) -> io::Result<u64> {
        if self.is_loading() && self.latest == Some((period, range)) {
            tracing::debug!(%period, "Contributions already being fetched");
            return Ok(self.generations.issued);
        }
        let generation = self.generations.issue();
        self.latest = Some((period, range));
        let source = Arc::clone(&self.source);
        let subject = self.subject.clone();
        let tx = self.tx.clone();
        tracing::info!(
            generation,
            %period,
            start = %range.start(),
            end = %range.end(),
            "Fetching contributions"
        );
        thread::Builder::new()
            .name(format!("contributions-{generation}"))
            .spawn(move || {
                let result = source.fetch_contributions(&subject, range);
                send(
                    &tx,
                    Completion::Contributions {
                        generation,
                        period,
                        range,
                        result,
                    },
                );
            })?;
        Ok(generation)
    }

    /// Drop any contributions request in flight, e.g., because the next
    /// period's dates could not be computed
    pub(crate) fn abandon_contributions(&mut self) {
        self.generations.abandon();
        self.latest = None;
    }

    /// Start fetching the detail for `date` unless a fetch for it is
    /// already running.  Returns `false` if nothing new was started.
    pub(crate) fn request_detail(&mut self, date: Date) -> io::Result<bool> {
        if self.details_in_flight.contains(&date) {
            tracing::debug!(%date, "Day detail already being fetched");
            return Ok(false);
        }
        let source = Arc::clone(&self.source);
        let subject = self.subject.clone();
        let tx = self.tx.clone();
        tracing::debug!(%date, "Fetching day detail");
        thread::Builder::new()
            .name(format!("detail-{date}"))
            .spawn(move || {
                let detail = detail_or_zeroed(&*source, &subject, date);
                send(&tx, Completion::Detail { date, detail });
            })?;
        self.details_in_flight.insert(date);
        Ok(true)
    }

    /// Collect everything that has finished since the last call, dropping
    /// anything that has been superseded
    pub(crate) fn poll(&mut self, active_detail: Option<Date>) -> Vec<Update> {
        let mut updates = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(completion) => updates.extend(self.accept(completion, active_detail)),
                // The loader itself holds a sender, so this never disconnects
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        updates
    }

    fn accept(&mut self, completion: Completion, active_detail: Option<Date>) -> Option<Update> {
        match completion {
            Completion::Contributions {
                generation,
                period,
                range,
                result,
            } => {
                if self.generations.accept(generation) {
                    Some(Update::Contributions {
                        period,
                        range,
                        result,
                    })
                } else {
                    tracing::debug!(generation, "Discarding superseded contributions");
                    None
                }
            }
            Completion::Detail { date, detail } => {
                self.details_in_flight.remove(&date);
                if active_detail == Some(date) {
                    Some(Update::Detail { date, detail })
                } else {
                    tracing::debug!(%date, "Discarding detail for inactive date");
                    None
                }
            }
        }
    }
}

fn send(tx: &Sender<Completion>, completion: Completion) {
    if tx.send(completion).is_err() {
        tracing::debug!("Loader dropped before fetch completed");
    }
}
