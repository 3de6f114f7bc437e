use askama::Template;
use common::Error;
use models::{Profile, Reservation, ReservationProposal};

use crate::mailer::Mailer;

#[derive(Clone, Debug, Template)]
#[template(path = "reservation_approved.html")]
struct ReservationApprovedTemplate {
	place_name: String,
	day:        String,
	start_time: String,
	end_time:   String,
}

#[derive(Clone, Debug, Template)]
#[template(path = "reservation_cancelled.html")]
struct ReservationCancelledTemplate {
	place_name: String,
	day:        String,
	start_time: String,
	end_time:   String,
}

#[derive(Clone, Debug, Template)]
#[template(path = "time_suggested.html")]
struct TimeSuggestedTemplate {
	place_name:      String,
	day:             String,
	start_time:      String,
	end_time:        String,
	proposal_url:    String,
	expires_in_days: i64,
}

#[derive(Clone, Debug, Template)]
#[template(path = "proposal_update.html")]
struct ProposalUpdateTemplate {
	place_name: String,
	outcome:    String,
}

impl Mailer {
	/// Notify a requester that their reservation was approved
	#[instrument(skip(self, profile))]
	pub(crate) async fn send_reservation_approved(
		&self,
		profile: &Profile,
		reservation: &Reservation,
		place_name: &str,
	) -> Result<(), Error> {
		let body = ReservationApprovedTemplate {
			place_name: place_name.to_string(),
			day:        reservation.day.format("%Y-%m-%d").to_string(),
			start_time: reservation.start_time.format("%H:%M").to_string(),
			end_time:   reservation.end_time.format("%H:%M").to_string(),
		};

		let mail = self.try_build_message(
			profile,
			"Your reservation was approved",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!(
			"sent approval email for reservation {} to profile {}",
			reservation.id, profile.id
		);

		Ok(())
	}

	/// Notify a requester that their reservation was cancelled
	#[instrument(skip(self, profile))]
	pub(crate) async fn send_reservation_cancelled(
		&self,
		profile: &Profile,
		reservation: &Reservation,
		place_name: &str,
	) -> Result<(), Error> {
		let body = ReservationCancelledTemplate {
			place_name: place_name.to_string(),
			day:        reservation.day.format("%Y-%m-%d").to_string(),
			start_time: reservation.start_time.format("%H:%M").to_string(),
			end_time:   reservation.end_time.format("%H:%M").to_string(),
		};

		let mail = self.try_build_message(
			profile,
			"Your reservation was cancelled",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!(
			"sent cancellation email for reservation {} to profile {}",
			reservation.id, profile.id
		);

		Ok(())
	}

	/// Notify a requester that an alternative time was suggested, with a link
	/// to respond to the proposal
	#[instrument(skip(self, profile, proposal))]
	pub(crate) async fn send_time_suggested(
		&self,
		profile: &Profile,
		proposal: &ReservationProposal,
		place_name: &str,
		frontend_url: &str,
		expires_in_days: i64,
	) -> Result<(), Error> {
		let proposal_url =
			format!("{frontend_url}/proposals/{}", proposal.token);

		let body = TimeSuggestedTemplate {
			place_name:      place_name.to_string(),
			day:             proposal.suggested_day.format("%Y-%m-%d").to_string(),
			start_time:      proposal.suggested_start.format("%H:%M").to_string(),
			end_time:        proposal.suggested_end.format("%H:%M").to_string(),
			proposal_url,
			expires_in_days,
		};

		let mail = self.try_build_message(
			profile,
			"A different time was suggested for your reservation",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!(
			"sent time suggestion email for reservation {} to profile {}",
			proposal.reservation_id, profile.id
		);

		Ok(())
	}

	/// Notify the admin who made a proposal of the requester's response
	#[instrument(skip(self, profile))]
	pub(crate) async fn send_proposal_update(
		&self,
		profile: &Profile,
		place_name: &str,
		outcome: &str,
	) -> Result<(), Error> {
		let body = ProposalUpdateTemplate {
			place_name: place_name.to_string(),
			outcome:    outcome.to_string(),
		};

		let mail = self.try_build_message(
			profile,
			"Your suggestion received a response",
			&body.render()?,
		)?;

		self.send(mail).await?;

		info!("sent proposal update email to profile {}", profile.id);

		Ok(())
	}
}
