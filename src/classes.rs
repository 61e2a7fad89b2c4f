use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::try_join_all;
use tracing::{error, info};

use crate::bookings::count_confirmed;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::models::{Booking, ClassOccurrence, ClassRequest, ClassWithOccupancy, Occupancy};
use crate::repository::Repository;
use crate::store::{DocumentStore, Filter};
use crate::validation::validate_class_request;

pub struct ClassService {
    classes: Repository<ClassOccurrence>,
    bookings: Repository<Booking>,
    clock: Arc<dyn Clock>,
}

impl ClassService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            classes: Repository::new(store.clone()),
            bookings: Repository::new(store),
            clock,
        }
    }

    /// Occurrences the request would create, without saving anything.
    pub fn preview(&self, request: &ClassRequest) -> Result<Vec<NaiveDateTime>, ServiceError> {
        let draft = validate_class_request(request)?;
        Ok(draft.plan.occurrences()?)
    }

    /// Saves one class per occurrence, one insert at a time.
    ///
    /// The first failed insert aborts the batch. Classes saved before it stay
    /// in the store.
    pub async fn create_classes(
        &self,
        organisation_id: &str,
        request: &ClassRequest,
    ) -> Result<Vec<ClassOccurrence>, ServiceError> {
        let draft = validate_class_request(request)?;
        let occurrences = draft.plan.occurrences()?;
        let total = occurrences.len();

        let mut created = Vec::with_capacity(total);
        for date in occurrences {
            let class = ClassOccurrence {
                id: String::new(),
                organisation_id: organisation_id.to_string(),
                name: draft.name.clone(),
                description: draft.description.clone(),
                instructor: draft.instructor.clone(),
                date,
                start_time: draft.start_time.clone(),
                end_time: draft.end_time.clone(),
                capacity: draft.capacity,
                booked_count: 0,
                created_at: self.clock.now(),
            };
            match self.classes.create(class).await {
                Ok(class) => created.push(class),
                Err(err) => {
                    error!(
                        organisation_id,
                        created = created.len(),
                        total,
                        error = %err,
                        "class batch aborted"
                    );
                    return Err(err.into());
                }
            }
        }

        info!(organisation_id, count = total, name = %draft.name, "classes created");
        Ok(created)
    }

    pub async fn get_class(
        &self,
        organisation_id: &str,
        id: &str,
    ) -> Result<ClassOccurrence, ServiceError> {
        self.classes
            .get(id)
            .await?
            .filter(|class| class.organisation_id == organisation_id)
            .ok_or_else(|| ServiceError::class_not_found(id))
    }

    /// Classes of the organisation whose date lies within `from..=to`, sorted
    /// by date and start time. The range is applied after the store query.
    pub async fn list_classes(
        &self,
        organisation_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ClassOccurrence>, ServiceError> {
        let mut classes: Vec<ClassOccurrence> = self
            .classes
            .list(&[Filter::eq("organisationId", organisation_id)])
            .await?
            .into_iter()
            .filter(|class| from.is_none_or(|from| class.date.date() >= from))
            .filter(|class| to.is_none_or(|to| class.date.date() <= to))
            .collect();

        classes.sort_by(|a, b| {
            a.date
                .date()
                .cmp(&b.date.date())
                .then(a.start_time.cmp(&b.start_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(classes)
    }

    pub async fn list_with_occupancy(
        &self,
        organisation_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ClassWithOccupancy>, ServiceError> {
        let classes = self.list_classes(organisation_id, from, to).await?;
        let futures = classes.into_iter().map(|class| async move {
            let occupancy = self.occupancy(&class).await?;
            Ok::<_, ServiceError>(ClassWithOccupancy { class, occupancy })
        });
        try_join_all(futures).await
    }

    /// Live booked count for a class. Re-queried on every call.
    pub async fn occupancy(&self, class: &ClassOccurrence) -> Result<Occupancy, ServiceError> {
        let booked = count_confirmed(&self.bookings, &class.organisation_id, &class.id).await?;
        Ok(Occupancy::new(class.id.clone(), booked, class.capacity))
    }

    pub async fn delete_class(&self, organisation_id: &str, id: &str) -> Result<(), ServiceError> {
        self.get_class(organisation_id, id).await?;
        self.classes.delete(id).await?;
        info!(organisation_id, class_id = id, "class deleted");
        Ok(())
    }
}
