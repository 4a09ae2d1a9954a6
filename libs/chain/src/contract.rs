use alloy::sol;

// Surface of the deployed donation tracker consumed by the reconciler.
sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IDonationTracker {
        event CampaignCreated(
            uint256 indexed campaignId,
            address indexed beneficiary,
            uint256 targetAmount,
            string title
        );
        event CampaignStatusChanged(uint256 indexed campaignId, bool isActive);
        event DonationReceived(
            uint256 indexed campaignId,
            address indexed donor,
            uint256 amount,
            uint256 timestamp,
            string message
        );
        event FundsWithdrawn(address indexed to, uint256 amount, uint256 timestamp);

        function owner() external view returns (address);
        function campaignCounter() external view returns (uint256);
        function getCampaign(uint256 campaignId)
            external
            view
            returns (address beneficiary, uint256 targetAmount, bool isActive);
        function getTotalFunds() external view returns (uint256);
        function getDonorList() external view returns (address[] memory);
        function donate(uint256 campaignId, string calldata message) external payable;
        function withdrawFunds(address to) external;
        function toggleCampaignStatus(uint256 campaignId) external;
    }
}
