//! Loan listings and the renewal workflow

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BorrowedInstance, InstanceFilter},
        pagination::{PageWindow, Paginated},
        renewal::{clean_renewal_date, RenewBookForm, RenewalFormView, RenewalOutcome},
    },
    repository::Repository,
};

/// Today's date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    per_page: i64,
}

impl LoansService {
    pub fn new(repository: Repository, per_page: i64) -> Self {
        Self { repository, per_page }
    }

    async fn list(&self, filter: InstanceFilter, page: Option<i64>) -> AppResult<Paginated<BorrowedInstance>> {
        let total = self.repository.instances.count(&filter).await?;
        let window = PageWindow::resolve(page, self.per_page, total)?;
        let today = today();
        let items = self
            .repository
            .instances
            .list(&filter, window.limit(), window.offset())
            .await?
            .into_iter()
            .map(|i| i.with_overdue(today))
            .collect();
        Ok(Paginated::new(items, total, window))
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn borrowed_by(&self, user_id: i32, page: Option<i64>) -> AppResult<Paginated<BorrowedInstance>> {
        self.list(InstanceFilter::on_loan_to(user_id), page).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, page: Option<i64>) -> AppResult<Paginated<BorrowedInstance>> {
        self.list(InstanceFilter::on_loan(), page).await
    }

    /// Unbound renewal form for a copy
    pub async fn renewal_form(&self, instance_id: Uuid) -> AppResult<RenewalFormView> {
        self.renewal_form_on(instance_id, today()).await
    }

    pub(crate) async fn renewal_form_on(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<RenewalFormView> {
        let instance = self.repository.instances.get_by_id(instance_id).await?;
        Ok(RenewalFormView::unbound(instance, today))
    }

    /// Renew a copy: the due date is replaced only if the proposed date is valid
    pub async fn renew(&self, instance_id: Uuid, form: RenewBookForm) -> AppResult<RenewalOutcome> {
        self.renew_on(instance_id, form, today()).await
    }

    pub(crate) async fn renew_on(
        &self,
        instance_id: Uuid,
        form: RenewBookForm,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let instance = self.repository.instances.get_by_id(instance_id).await?;

        match clean_renewal_date(form.renewal_date.as_deref(), today) {
            Ok(due_back) => {
                let renewed = self
                    .repository
                    .instances
                    .update_due_back(instance_id, due_back)
                    .await?;
                tracing::info!("Book instance {} renewed until {}", instance_id, due_back);
                Ok(RenewalOutcome::Renewed(renewed))
            }
            Err(error) => {
                tracing::debug!("Renewal of {} rejected: {}", instance_id, error);
                Ok(RenewalOutcome::Rejected(RenewalFormView::rejected(instance, form, error)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    use crate::{
        error::AppError,
        models::{
            book_instance::{BookInstance, LoanStatus},
            renewal::RENEWAL_DATE_FIELD,
        },
        repository::mock::MockRepository,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn on_loan(id: Uuid, due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id,
            book_id: 4,
            imprint: "Gollancz, 2011".to_string(),
            due_back,
            status: LoanStatus::OnLoan,
            borrower_id: Some(2),
        }
    }

    fn form(date: NaiveDate) -> RenewBookForm {
        RenewBookForm {
            renewal_date: Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    #[tokio::test]
    async fn test_valid_renewal_persists_due_back() {
        let id = Uuid::new_v4();
        let proposed = today() + Duration::weeks(2);
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .with(eq(id))
            .times(1)
            .returning(move |id| Ok(on_loan(id, Some(today()))));
        repo.instances
            .expect_update_due_back()
            .with(eq(id), eq(proposed))
            .times(1)
            .returning(|id, date| Ok(on_loan(id, Some(date))));

        let service = LoansService::new(repo.build(), 10);
        let outcome = assert_ok!(service.renew_on(id, form(proposed), today()).await);

        match outcome {
            RenewalOutcome::Renewed(instance) => assert_eq!(instance.due_back, Some(proposed)),
            other => panic!("expected renewal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_renewal_is_not_persisted() {
        let id = Uuid::new_v4();
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .returning(move |id| Ok(on_loan(id, Some(today()))));
        repo.instances.expect_update_due_back().never();

        let service = LoansService::new(repo.build(), 10);
        let too_late = today() + Duration::weeks(4) + Duration::days(1);

        match assert_ok!(service.renew_on(id, form(too_late), today()).await) {
            RenewalOutcome::Rejected(view) => {
                assert_eq!(view.renewal_date, form(too_late).renewal_date);
                assert_eq!(
                    view.errors[RENEWAL_DATE_FIELD],
                    vec!["Invalid date - renewal more than 4 weeks ahead".to_string()]
                );
                assert_eq!(view.book_instance.due_back, Some(today()));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        let past = today() - Duration::days(1);
        match assert_ok!(service.renew_on(id, form(past), today()).await) {
            RenewalOutcome::Rejected(view) => {
                assert_eq!(view.errors[RENEWAL_DATE_FIELD], vec!["Invalid date - renewal in past".to_string()]);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_boundary_dates_are_persisted() {
        let id = Uuid::new_v4();
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .returning(move |id| Ok(on_loan(id, None)));
        repo.instances
            .expect_update_due_back()
            .times(2)
            .returning(|id, date| Ok(on_loan(id, Some(date))));

        let service = LoansService::new(repo.build(), 10);
        for date in [today(), today() + Duration::weeks(4)] {
            let outcome = assert_ok!(service.renew_on(id, form(date), today()).await);
            assert!(matches!(outcome, RenewalOutcome::Renewed(i) if i.due_back == Some(date)));
        }
    }

    #[tokio::test]
    async fn test_missing_instance_is_not_found() {
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book instance {} not found", id))));
        repo.instances.expect_update_due_back().never();

        let service = LoansService::new(repo.build(), 10);
        let result = service.renew_on(Uuid::new_v4(), form(today()), today()).await;
        assert!(matches!(assert_err!(result), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unbound_form_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .returning(move |id| Ok(on_loan(id, None)));

        let service = LoansService::new(repo.build(), 10);
        let view = assert_ok!(service.renewal_form_on(id, today()).await);
        assert_eq!(view.renewal_date, Some("2024-05-23".to_string()));
        assert!(view.errors.is_empty());
    }

    #[tokio::test]
    async fn test_renewal_with_trailing_text_is_rejected() {
        let id = Uuid::new_v4();
        let mut repo = MockRepository::new();
        repo.instances
            .expect_get_by_id()
            .returning(move |id| Ok(on_loan(id, Some(today()))));
        repo.instances.expect_update_due_back().never();

        let service = LoansService::new(repo.build(), 10);
        let form = RenewBookForm {
            renewal_date: Some("2024-05-10 not a date".to_string()),
        };
        match assert_ok!(service.renew_on(id, form, today()).await) {
            RenewalOutcome::Rejected(view) => {
                assert_eq!(view.errors[RENEWAL_DATE_FIELD], vec!["Enter a valid date.".to_string()]);
                assert_eq!(view.renewal_date.as_deref(), Some("2024-05-10 not a date"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_borrowed_by_filters_on_borrower_and_status() {
        let mut repo = MockRepository::new();
        repo.instances
            .expect_count()
            .withf(|f| *f == InstanceFilter::on_loan_to(2))
            .returning(|_| Ok(11));
        repo.instances
            .expect_list()
            .withf(|f, limit, offset| *f == InstanceFilter::on_loan_to(2) && *limit == 10 && *offset == 10)
            .returning(|_, _, _| Ok(vec![]));

        let service = LoansService::new(repo.build(), 10);
        let page = assert_ok!(service.borrowed_by(2, Some(2)).await);
        assert_eq!(page.total, 11);
        assert_eq!(page.num_pages, 2);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_all_borrowed_page_out_of_range() {
        let mut repo = MockRepository::new();
        repo.instances.expect_count().returning(|_| Ok(3));
        repo.instances.expect_list().never();

        let service = LoansService::new(repo.build(), 10);
        let result = service.all_borrowed(Some(2)).await;
        assert!(matches!(assert_err!(result), AppError::NotFound(_)));
    }
}
