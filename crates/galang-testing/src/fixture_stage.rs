#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FixtureStage {
    /// Admin, creator and donor accounts exist
    UsersRegistered,

    /// The creator has an open campaign
    CampaignOpen,

    /// The donor has a pending donation with an invoice
    DonationPending,

    /// The invoice callback marked the donation paid
    DonationPaid,

    /// The creator ended the campaign and was credited
    CampaignEnded,
}

impl FixtureStage {
    pub fn all() -> &'static [FixtureStage] {
        &[
            FixtureStage::UsersRegistered,
            FixtureStage::CampaignOpen,
            FixtureStage::DonationPending,
            FixtureStage::DonationPaid,
            FixtureStage::CampaignEnded,
        ]
    }
}
